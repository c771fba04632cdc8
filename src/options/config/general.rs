use serde::Deserialize;

use super::StringOrNum;

#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct GeneralConfig {
    /// Time between the two CPU counter reads.
    pub(crate) rate: Option<StringOrNum>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rate_as_number_or_string() {
        let generated: GeneralConfig = toml_edit::de::from_str("rate = 500").unwrap();
        assert_eq!(generated.rate, Some(StringOrNum::Num(500)));

        let generated: GeneralConfig = toml_edit::de::from_str(r#"rate = "1s""#).unwrap();
        assert_eq!(generated.rate, Some(StringOrNum::String("1s".to_string())));
    }
}
