use std::fmt;

use serde::{Deserialize, Serialize};

/// Parsed reply to `*IDN?`: `"<manufacturer>,<model>,<serial>,<firmware>"`.
///
/// Replies with fewer fields leave the remaining ones empty; `raw` always keeps
/// the original text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identification {
    pub raw: String,
    pub manufacturer: String,
    pub model: String,
    pub serial: String,
    pub firmware: String,
}

impl Identification {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let mut fields = raw.splitn(4, ',').map(str::trim);
        let mut next = || fields.next().unwrap_or_default().to_string();

        Self {
            manufacturer: next(),
            model: next(),
            serial: next(),
            firmware: next(),
            raw: raw.to_string(),
        }
    }

    pub fn role(&self) -> InstrumentRole {
        InstrumentRole::from_identification(&self.raw)
    }
}

impl fmt::Display for Identification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Capability group an instrument belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstrumentRole {
    Oscilloscope,
    SourceMeasureUnit,
    FunctionGenerator,
    DcPowerSupply,
    Unknown,
}

/// Identification substrings of instruments with a known role.
const KNOWN_MODELS: &[(&str, InstrumentRole)] = &[
    ("Agilent Technologies,33522B", InstrumentRole::FunctionGenerator),
    ("Keysight Technologies,33522B", InstrumentRole::FunctionGenerator),
    ("Keithley Instruments Inc., Model 26", InstrumentRole::SourceMeasureUnit),
    ("KEITHLEY INSTRUMENTS INC.,MODEL 26", InstrumentRole::SourceMeasureUnit),
    ("DSO-X 3", InstrumentRole::Oscilloscope),
    ("MSO-X 3", InstrumentRole::Oscilloscope),
    ("SPD13", InstrumentRole::DcPowerSupply),
];

impl InstrumentRole {
    pub fn from_identification(raw: &str) -> Self {
        KNOWN_MODELS
            .iter()
            .find(|(needle, _)| raw.contains(needle))
            .map(|(_, role)| *role)
            .unwrap_or(Self::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Oscilloscope => "Oscilloscope",
            Self::SourceMeasureUnit => "SMU",
            Self::FunctionGenerator => "FunctionGenerator",
            Self::DcPowerSupply => "DCPowerSupply",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for InstrumentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_identification() {
        let idn = Identification::parse("Agilent Technologies,33522B,MY52800000,3.03-1.19-2.00-52-00\n");
        assert_eq!(idn.manufacturer, "Agilent Technologies");
        assert_eq!(idn.model, "33522B");
        assert_eq!(idn.serial, "MY52800000");
        assert_eq!(idn.firmware, "3.03-1.19-2.00-52-00");
        assert_eq!(idn.role(), InstrumentRole::FunctionGenerator);
    }

    #[test]
    fn test_parse_short_identification() {
        let idn = Identification::parse("ACME Bench Meter");
        assert_eq!(idn.manufacturer, "ACME Bench Meter");
        assert_eq!(idn.model, "");
        assert_eq!(idn.firmware, "");
        assert_eq!(idn.role(), InstrumentRole::Unknown);
    }

    #[test]
    fn test_firmware_keeps_trailing_commas() {
        let idn = Identification::parse("A,B,C,1.0,beta");
        assert_eq!(idn.firmware, "1.0,beta");
    }

    #[test]
    fn test_known_roles() {
        let cases = [
            ("Keithley Instruments Inc., Model 2636B, 4321, 3.2.2", InstrumentRole::SourceMeasureUnit),
            ("KEYSIGHT TECHNOLOGIES,DSO-X 3034T,MY1,07.50", InstrumentRole::Oscilloscope),
            ("AGILENT TECHNOLOGIES,MSO-X 3024A,MY2,02.43", InstrumentRole::Oscilloscope),
            ("Siglent Technologies,SPD1305X,SPD13DCX1,1.01", InstrumentRole::DcPowerSupply),
            ("Rigol,DG1022,DG1,00.03", InstrumentRole::Unknown),
        ];
        for (raw, role) in cases {
            assert_eq!(InstrumentRole::from_identification(raw), role, "{}", raw);
        }
    }

    #[test]
    fn test_error_text_in_name_is_not_special() {
        let idn = Identification::parse("Error Instruments,EI-1,1,1");
        assert_eq!(idn.manufacturer, "Error Instruments");
    }
}
