use pauta_core::error::PautaError;
use serde::Serialize;

pub fn print<T: Serialize + ?Sized>(value: &T) -> Result<(), PautaError> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}
