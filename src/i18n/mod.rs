//! Request language resolution and message translation.
//!
//! Localizable document fields are stored as `<base>En` / `<base>Ar` column
//! pairs; [`Lang`] decides which variant a request sees. Translation is a
//! lookup into a fixed catalog of user-facing sentences - unknown messages
//! pass through unchanged.

use axum::http::HeaderMap;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Resolved request language.
///
/// `All` means "do not collapse localized variants": documents keep both
/// suffixed fields and no base field is synthesized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lang {
    En,
    Ar,
    All,
}

impl Lang {
    /// Resolve the `lang` request header into a tag. Case-insensitive;
    /// anything unrecognized (or absent) defaults to English.
    pub fn resolve(headers: &HeaderMap) -> Self {
        let value = headers
            .get("lang")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        match value.trim().to_ascii_lowercase().as_str() {
            "ar" => Lang::Ar,
            "all" => Lang::All,
            _ => Lang::En,
        }
    }

    /// Column-name suffixes this tag selects, in stable order.
    pub fn suffixes(self) -> &'static [&'static str] {
        match self {
            Lang::En => &["En"],
            Lang::Ar => &["Ar"],
            Lang::All => &["En", "Ar"],
        }
    }

    /// The single variant suffix for a collapsing tag; `None` for `All`.
    pub fn suffix(self) -> Option<&'static str> {
        match self {
            Lang::En => Some("En"),
            Lang::Ar => Some("Ar"),
            Lang::All => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Lang::En => "en",
            Lang::Ar => "ar",
            Lang::All => "all",
        }
    }
}

/// Exact-sentence catalog, English to Arabic.
fn catalog() -> &'static HashMap<&'static str, &'static str> {
    static CATALOG: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    CATALOG.get_or_init(|| {
        HashMap::from([
            (
                "Please complete your profile to continue",
                "يرجى إكمال ملفك الشخصي للمتابعة",
            ),
            (
                "Your account is blocked, please contact the support team",
                "تم حظر حسابك، يرجى التواصل مع فريق الدعم",
            ),
            (
                "Your account email is not verified",
                "البريد الإلكتروني لحسابك غير مُوثَّق",
            ),
        ])
    })
}

/// Sentence templates keyed by an English suffix; `{}` receives whatever
/// preceded the suffix (typically an entity label).
const SUFFIX_TEMPLATES: &[(&str, &str)] = &[
    (" not found", "{} غير موجود"),
    (" created successfully", "تم إنشاء {} بنجاح"),
    (" updated successfully", "تم تحديث {} بنجاح"),
    (" deleted successfully", "تم حذف {} بنجاح"),
];

/// Sentence templates keyed by an English prefix; `{}` receives the rest.
const PREFIX_TEMPLATES: &[(&str, &str)] = &[
    ("Registered successfully as ", "تم التسجيل بنجاح باسم {}"),
    ("Welcome back ", "مرحبًا بعودتك {}"),
];

/// Translate a user-facing message for the resolved language.
///
/// English (and `all`) pass through. Arabic tries the exact catalog, then
/// the suffix/prefix templates; unknown messages pass through untranslated.
pub fn translate(message: &str, lang: Lang) -> String {
    if lang != Lang::Ar {
        return message.to_string();
    }
    if let Some(ar) = catalog().get(message) {
        return (*ar).to_string();
    }
    for (suffix, template) in SUFFIX_TEMPLATES {
        if let Some(subject) = message.strip_suffix(suffix) {
            return template.replace("{}", subject);
        }
    }
    for (prefix, template) in PREFIX_TEMPLATES {
        if let Some(rest) = message.strip_prefix(prefix) {
            return template.replace("{}", rest);
        }
    }
    message.to_string()
}

/// "subCategory" -> "sub category"
pub fn split_camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_ascii_uppercase() && i > 0 {
            out.push(' ');
        }
        out.push(c.to_ascii_lowercase());
    }
    out
}

pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Field/model key to display form: "notificationToken" -> "Notification token"
pub fn humanize(name: &str) -> String {
    capitalize_first(&split_camel_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(lang: Option<&str>) -> HeaderMap {
        let mut h = HeaderMap::new();
        if let Some(l) = lang {
            h.insert("lang", HeaderValue::from_str(l).unwrap());
        }
        h
    }

    #[test]
    fn resolve_is_case_insensitive_and_defaults_to_en() {
        assert_eq!(Lang::resolve(&headers(Some("AR"))), Lang::Ar);
        assert_eq!(Lang::resolve(&headers(Some("All"))), Lang::All);
        assert_eq!(Lang::resolve(&headers(Some("fr"))), Lang::En);
        assert_eq!(Lang::resolve(&headers(None)), Lang::En);
    }

    #[test]
    fn suffixes_expand_for_all() {
        assert_eq!(Lang::Ar.suffixes(), &["Ar"]);
        assert_eq!(Lang::All.suffixes(), &["En", "Ar"]);
        assert_eq!(Lang::All.suffix(), None);
    }

    #[test]
    fn translate_passthrough_for_english() {
        assert_eq!(translate("Banner not found", Lang::En), "Banner not found");
    }

    #[test]
    fn translate_templates_for_arabic() {
        assert_eq!(translate("Banner not found", Lang::Ar), "Banner غير موجود");
        assert_eq!(
            translate("Category created successfully", Lang::Ar),
            "تم إنشاء Category بنجاح"
        );
        assert_eq!(
            translate("Registered successfully as a@b.c", Lang::Ar),
            "تم التسجيل بنجاح باسم a@b.c"
        );
    }

    #[test]
    fn translate_unknown_passes_through() {
        assert_eq!(translate("Some odd message", Lang::Ar), "Some odd message");
    }

    #[test]
    fn humanize_splits_camel_case() {
        assert_eq!(humanize("notificationToken"), "Notification token");
        assert_eq!(humanize("image"), "Image");
        assert_eq!(split_camel_case("subCategory"), "sub category");
    }
}
