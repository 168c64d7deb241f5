use serde::Deserialize;

const SHARE_TEXT: &str = "Check out this information from Binary Semantics!";
const MAIL_SUBJECT: &str = "Information from Binary Semantics";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SharePlatform {
    Whatsapp,
    Email,
}

/// Build the outbound deep link for a share action. Pure construction; the
/// shell opens the URL, nothing flows back into the engine.
pub fn share_url(platform: SharePlatform, page_url: &str) -> String {
    match platform {
        SharePlatform::Whatsapp => format!(
            "https://wa.me/?text={}",
            urlencoding::encode(&format!("{} {}", SHARE_TEXT, page_url))
        ),
        SharePlatform::Email => format!(
            "mailto:?subject={}&body={}",
            urlencoding::encode(MAIL_SUBJECT),
            urlencoding::encode(&format!("{}\n\n{}", SHARE_TEXT, page_url))
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whatsapp_link_embeds_text_and_page_url() {
        let url = share_url(SharePlatform::Whatsapp, "https://www.binarysemantics.com");
        assert!(url.starts_with("https://wa.me/?text="));
        assert!(url.contains("Binary%20Semantics"));
        assert!(url.contains("https%3A%2F%2Fwww.binarysemantics.com"));
    }

    #[test]
    fn mail_link_has_subject_and_body() {
        let url = share_url(SharePlatform::Email, "https://www.binarysemantics.com");
        assert!(url.starts_with("mailto:?subject="));
        assert!(url.contains("&body="));
        // Newlines between text and URL must be percent-encoded.
        assert!(url.contains("%0A%0A"));
    }
}
