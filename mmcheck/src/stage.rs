/// A stage in the processing of a database.
///
/// This is useful to omit certain parts of processing.
/// Omitting one stage also omits all stages after it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Proof verification
    Verify,
}

impl core::str::FromStr for Stage {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "verify" => Ok(Self::Verify),
            _ => Err("unknown stage: ".to_owned() + s),
        }
    }
}

#[test]
fn parse() {
    assert_eq!("verify".parse(), Ok(Stage::Verify));
    assert!("check".parse::<Stage>().is_err());
}
