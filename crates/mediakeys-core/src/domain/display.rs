/// Opaque reference to a physical display.
///
/// On macOS this wraps a `CGDirectDisplayID`.  The engine never interprets
/// the value; it only forwards it to the brightness and volume controllers
/// as a hint for which screen the pointer was on when the key was pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DisplayRef(pub u32);

impl std::fmt::Display for DisplayRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "display#{}", self.0)
    }
}
