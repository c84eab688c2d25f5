//! Output formatting utilities for the CLI.

use serde::Serialize;

pub trait CommandOutput: Serialize {
    fn to_human(&self) -> String;
    fn to_json(&self) -> serde_json::Value;
}

pub fn output<T: CommandOutput>(result: &T, json_mode: bool) {
    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&result.to_json()).unwrap_or_default()
        );
    } else {
        println!("{}", result.to_human());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Sample {
        count: usize,
    }

    impl CommandOutput for Sample {
        fn to_human(&self) -> String {
            format!("{} things", self.count)
        }

        fn to_json(&self) -> serde_json::Value {
            serde_json::to_value(self).unwrap_or_default()
        }
    }

    #[test]
    fn test_json_view_matches_fields() {
        let sample = Sample { count: 3 };
        assert_eq!(sample.to_json()["count"], 3);
        assert_eq!(sample.to_human(), "3 things");
    }
}
