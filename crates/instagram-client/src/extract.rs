use regex::Regex;
use std::sync::LazyLock;

static PIC_HD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""profile_pic_url_hd"\s*:\s*"([^"]+)""#).unwrap());

static PIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""profile_pic_url"\s*:\s*"([^"]+)""#).unwrap());

/// Extract the avatar URL from a profile page body, preferring the
/// high-definition field over the standard one.
pub fn extract_avatar_url(body: &str) -> Option<String> {
    for re in [&*PIC_HD_RE, &*PIC_RE] {
        if let Some(caps) = re.captures(body) {
            let url = decode_url(&caps[1]);
            if !url.is_empty() {
                return Some(url);
            }
        }
    }
    None
}

/// URLs embedded in the page JSON carry HTML entities plus escaped
/// ampersand (`\u0026`) and slash (`\/`) sequences.
fn decode_url(raw: &str) -> String {
    let unescaped = raw.replace("\\u0026", "&").replace("\\/", "/");
    html_escape::decode_html_entities(&unescaped).into_owned()
}
