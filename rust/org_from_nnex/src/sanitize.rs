use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref STRIPPED: Regex = Regex::new(r#"[-'(),:|?./"]"#).expect("valid title pattern");
}

/// Turns a note title into a file-system friendly stem.
///
/// Lowercases, trims, drops `- ' ( ) , : | ? . / "` and joins the remaining
/// words with hyphens. Distinct titles may collide.
pub fn sanitize_title(title: &str) -> String {
    let lower = title.to_lowercase();
    let stripped = STRIPPED.replace_all(lower.trim(), "");
    stripped.replace(' ', "-")
}
