use std::sync::LazyLock;

use regex::Regex;

use crate::pipeline::extraction::title_case;

const NAME_PLACEHOLDER: &str = "{nama}";

static NICKNAME_FILLER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^panggil(?:\s+|$)").expect("Invalid nickname filler regex"));

static FULL_NAME_FILLER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(saya|nama\s+saya|nama)\s+").expect("Invalid full name filler regex")
});

/// Question text with an optional `{nama}` placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate(&'static str);

impl PromptTemplate {
    pub const fn new(text: &'static str) -> Self {
        Self(text)
    }

    pub fn text(&self) -> &'static str {
        self.0
    }

    pub fn mentions_name(&self) -> bool {
        self.0.contains(NAME_PLACEHOLDER)
    }

    pub fn render(&self, name: &str) -> String {
        self.0.replace(NAME_PLACEHOLDER, name)
    }
}

/// Name used to address the patient.
///
/// The nickname answer wins, minus a leading "panggil". When that leaves
/// nothing, the first word of the full-name answer is used. Either way the
/// result is titlecased; with neither answer recorded it is empty.
pub fn preferred_name(nickname: Option<&str>, full_name: Option<&str>) -> String {
    let from_nickname = nickname
        .map(|raw| NICKNAME_FILLER.replace(raw.trim(), "").trim().to_string())
        .filter(|name| !name.is_empty());

    let chosen = from_nickname.or_else(|| {
        full_name.and_then(|raw| {
            FULL_NAME_FILLER
                .replace(raw.trim(), "")
                .split_whitespace()
                .next()
                .map(str::to_string)
        })
    });

    chosen.map(|name| title_case(&name)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_substitutes_every_placeholder() {
        let t = PromptTemplate::new("{nama}, halo {nama}");
        assert!(t.mentions_name());
        assert_eq!(t.render("Budi"), "Budi, halo Budi");
    }

    #[test]
    fn template_without_placeholder_is_verbatim() {
        let t = PromptTemplate::new("Jenis kelamin Anda?");
        assert!(!t.mentions_name());
        assert_eq!(t.render("Budi"), "Jenis kelamin Anda?");
    }

    #[test]
    fn nickname_preferred_and_filler_stripped() {
        assert_eq!(preferred_name(Some("Panggil budi"), Some("Budi Santoso")), "Budi");
        assert_eq!(preferred_name(Some("ani"), Some("Nama saya Siti")), "Ani");
    }

    #[test]
    fn full_name_first_token_when_no_nickname() {
        assert_eq!(preferred_name(None, Some("nama saya budi santoso")), "Budi");
        assert_eq!(preferred_name(None, Some("Saya Rina")), "Rina");
    }

    #[test]
    fn empty_nickname_falls_back_to_full_name() {
        assert_eq!(preferred_name(Some("panggil "), Some("dewi lestari")), "Dewi");
        assert_eq!(preferred_name(Some("   "), Some("dewi lestari")), "Dewi");
    }

    #[test]
    fn nothing_recorded_is_empty() {
        assert_eq!(preferred_name(None, None), "");
        assert_eq!(preferred_name(None, Some("  ")), "");
    }
}
