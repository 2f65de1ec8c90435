use tripwire_config::ResilienceSettings;

pub fn execute(settings: &ResilienceSettings) -> eyre::Result<()> {
    println!("{}", render(settings)?);
    Ok(())
}

/// Pretty-printed JSON of the effective settings
pub fn render(settings: &ResilienceSettings) -> eyre::Result<String> {
    Ok(serde_json::to_string_pretty(&settings.effective())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_lists_every_category() {
        let json = render(&ResilienceSettings::default()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        for key in ["simulator", "prosim", "gsx", "network", "default"] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert_eq!(value["prosim"]["max_retries"], 5);
        assert_eq!(value["default"]["recovery_time_ms"], 60_000);
    }
}
