use crate::bluetooth::LmError;
use crate::protocol::*;

pub const COFFEE_MIN_TEMPERATURE: f64 = 85.0;
pub const COFFEE_MAX_TEMPERATURE: f64 = 104.0;

/// Checks a boiler target against what `model` accepts, returning the value to send.
pub fn check_temperature(
    model: MachineModel,
    boiler: BoilerType,
    celsius: f64,
) -> Result<f64, LmError> {
    if !celsius.is_finite() {
        return Err(LmError::InvalidArgument(format!(
            "Temperature must be a finite number, got {}",
            celsius
        )));
    }
    match boiler {
        BoilerType::Coffee => {
            if !(COFFEE_MIN_TEMPERATURE..=COFFEE_MAX_TEMPERATURE).contains(&celsius) {
                return Err(LmError::InvalidArgument(format!(
                    "Coffee temp must be between {} and {} (°C)",
                    COFFEE_MIN_TEMPERATURE, COFFEE_MAX_TEMPERATURE
                )));
            }
            // Ties go to even, so 93.25 becomes 93.2
            Ok((celsius * 10.0).round_ties_even() / 10.0)
        }
        BoilerType::Steam => match model {
            MachineModel::LineaMicra if !SteamLevel::is_level(celsius) => {
                Err(LmError::InvalidArgument(format!(
                    "Steam temp must be one of {} (°C)",
                    SteamLevel::ALL.map(|level| u8::from(level).to_string()).join(", ")
                )))
            }
            MachineModel::LineaMini => Err(LmError::Unsupported(format!(
                "Steam temp is not supported on {}",
                model.full_model_name()
            ))),
            _ => Ok(celsius),
        },
    }
}
