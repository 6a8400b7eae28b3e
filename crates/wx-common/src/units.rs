//! Physical units attached to model fields and their display conversions.

use std::fmt;
use std::str::FromStr;

use crate::{WxError, WxResult};

/// Units that appear in model output or on chart axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    Kelvin,
    Celsius,
    MetersPerSecond,
    KilometersPerHour,
    Knots,
    Pascal,
    Hectopascal,
    Meters,
    /// Geopotential, m² s⁻²
    Geopotential,
    /// Precipitation amount; 1 kg m⁻² of water is 1 mm
    KgPerSquareMeter,
    Millimeters,
    Percent,
    Dimensionless,
}

impl Unit {
    pub fn symbol(&self) -> &'static str {
        match self {
            Unit::Kelvin => "K",
            Unit::Celsius => "degC",
            Unit::MetersPerSecond => "m/s",
            Unit::KilometersPerHour => "km/h",
            Unit::Knots => "kn",
            Unit::Pascal => "Pa",
            Unit::Hectopascal => "hPa",
            Unit::Meters => "m",
            Unit::Geopotential => "m2 s-2",
            Unit::KgPerSquareMeter => "kg m-2",
            Unit::Millimeters => "mm",
            Unit::Percent => "%",
            Unit::Dimensionless => "1",
        }
    }

    /// Transform that converts values in `self` into `to`.
    pub fn transform_to(&self, to: Unit) -> WxResult<UnitTransform> {
        use Unit::*;
        let transform = match (*self, to) {
            (a, b) if a == b => UnitTransform::None,
            (Kelvin, Celsius) => UnitTransform::Subtract(273.15),
            (Celsius, Kelvin) => UnitTransform::Subtract(-273.15),
            (MetersPerSecond, KilometersPerHour) => UnitTransform::Linear { scale: 3.6, offset: 0.0 },
            (KilometersPerHour, MetersPerSecond) => UnitTransform::Divide(3.6),
            (MetersPerSecond, Knots) => UnitTransform::Linear {
                scale: 1.943_844_5,
                offset: 0.0,
            },
            (Knots, MetersPerSecond) => UnitTransform::Divide(1.943_844_5),
            (Pascal, Hectopascal) => UnitTransform::Divide(100.0),
            (Hectopascal, Pascal) => UnitTransform::Linear { scale: 100.0, offset: 0.0 },
            (KgPerSquareMeter, Millimeters) | (Millimeters, KgPerSquareMeter) => UnitTransform::None,
            (Percent, Dimensionless) => UnitTransform::Divide(100.0),
            (Dimensionless, Percent) => UnitTransform::Linear { scale: 100.0, offset: 0.0 },
            (from, to) => {
                return Err(WxError::UnitConversion {
                    from: from.symbol().to_string(),
                    to: to.symbol().to_string(),
                })
            }
        };
        Ok(transform)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Unit {
    type Err = WxError;

    /// Parse the unit spellings found in CF metadata and pint-style strings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace("**", "").replace('^', "");
        let unit = match normalized.as_str() {
            "K" | "kelvin" => Unit::Kelvin,
            "degC" | "C" | "°C" | "celsius" | "degree_Celsius" => Unit::Celsius,
            "m/s" | "m s-1" | "m.s-1" | "ms-1" => Unit::MetersPerSecond,
            "km/h" | "kph" | "km h-1" => Unit::KilometersPerHour,
            "kn" | "kt" | "knot" | "knots" => Unit::Knots,
            "Pa" => Unit::Pascal,
            "hPa" | "mbar" | "mb" => Unit::Hectopascal,
            "m" | "gpm" => Unit::Meters,
            "m2 s-2" | "m2s-2" | "m2/s2" => Unit::Geopotential,
            "kg m-2" | "kg/m2" | "kg m**-2" => Unit::KgPerSquareMeter,
            "mm" => Unit::Millimeters,
            "%" | "percent" => Unit::Percent,
            "1" | "" | "-" | "(0 - 1)" | "dimensionless" => Unit::Dimensionless,
            _ => return Err(WxError::UnknownUnit(s.to_string())),
        };
        Ok(unit)
    }
}

/// Unit transformation for converting raw data values to display values.
/// Supports subtraction (K→C), division (Pa→hPa), and linear (scale + offset).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum UnitTransform {
    /// No transformation
    #[default]
    None,
    /// Subtract a value (e.g., K→C: subtract 273.15)
    Subtract(f32),
    /// Divide by a value (e.g., Pa→hPa: divide by 100)
    Divide(f32),
    /// Linear transform: value * scale + offset
    Linear { scale: f32, offset: f32 },
}

impl UnitTransform {
    /// Apply the transformation to a value
    pub fn apply(&self, value: f32) -> f32 {
        match self {
            Self::None => value,
            Self::Subtract(offset) => value - offset,
            Self::Divide(divisor) => value / divisor,
            Self::Linear { scale, offset } => value * scale + offset,
        }
    }

    /// Apply the transformation in place to a whole buffer.
    pub fn apply_slice(&self, values: &mut [f32]) {
        if matches!(self, Self::None) {
            return;
        }
        for v in values.iter_mut() {
            *v = self.apply(*v);
        }
    }
}

/// Convert a single value between two unit strings.
pub fn convert(value: f32, from: &str, to: &str) -> WxResult<f32> {
    let transform = from.parse::<Unit>()?.transform_to(to.parse()?)?;
    Ok(transform.apply(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cf_spellings() {
        assert_eq!("m s-1".parse::<Unit>().unwrap(), Unit::MetersPerSecond);
        assert_eq!("m s**-1".parse::<Unit>().unwrap(), Unit::MetersPerSecond);
        assert_eq!("kg m-2".parse::<Unit>().unwrap(), Unit::KgPerSquareMeter);
        assert_eq!("m**2 s**-2".parse::<Unit>().unwrap(), Unit::Geopotential);
        assert!("furlong".parse::<Unit>().is_err());
    }

    #[test]
    fn test_conversions() {
        assert!((convert(273.15, "K", "degC").unwrap()).abs() < 1e-4);
        assert!((convert(10.0, "m/s", "kph").unwrap() - 36.0).abs() < 1e-4);
        assert!((convert(101325.0, "Pa", "hPa").unwrap() - 1013.25).abs() < 1e-3);
        assert!((convert(20.0, "degC", "K").unwrap() - 293.15).abs() < 1e-3);
    }

    #[test]
    fn test_incompatible_units() {
        let err = convert(1.0, "K", "hPa").unwrap_err();
        assert!(matches!(err, WxError::UnitConversion { .. }));
    }

    #[test]
    fn test_apply_slice() {
        let mut values = vec![100.0, 200.0, f32::NAN];
        UnitTransform::Divide(100.0).apply_slice(&mut values);
        assert_eq!(values[0], 1.0);
        assert_eq!(values[1], 2.0);
        assert!(values[2].is_nan());
    }
}
