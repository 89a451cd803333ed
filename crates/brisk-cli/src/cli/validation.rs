/// Parse a listening port, rejecting 0.
///
/// Port 0 would ask the OS for an ephemeral port, which makes the printed
/// server URL meaningless.
///
/// # Errors
///
/// Returns an error message if the value is not a number in `1..=65535`.
pub fn parse_port(s: &str) -> Result<u16, String> {
    let port: u16 = s
        .parse()
        .map_err(|_| format!("Port must be a number between 1 and 65535: '{}'", s))?;

    if port == 0 {
        return Err("Port must be between 1 and 65535".to_string());
    }

    Ok(port)
}
