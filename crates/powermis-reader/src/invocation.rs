//! Scheme invocation parsing
//!
//! The OS hands the reader a URL such as
//! `powermis://reader?file_url=<urlencoded>&file_key=<key>`, either as a
//! command-line argument (cold start, second instance) or through an
//! open-url callback.

use powermis_core::InvocationParams;
use url::Url;

/// Path values accepted as "open the reader"
const READER_PATHS: [&str; 3] = ["/reader", "reader", "//reader"];

/// Extract the document location and key from an invocation URL.
///
/// Returns `None` when the URL does not parse, does not address the reader,
/// or lacks a non-empty `file_url` or `file_key`.
pub fn parse_invocation(raw: &str) -> Option<InvocationParams> {
    let url = Url::parse(raw).ok()?;

    // `scheme://reader?...` puts "reader" in the host and leaves the path empty
    let target = match url.path() {
        "" => url.host_str().unwrap_or_default(),
        path => path,
    };
    if !READER_PATHS.contains(&target) {
        return None;
    }

    let file_url = query_value(&url, "file_url")?;
    let file_key = query_value(&url, "file_key")?;
    Some(InvocationParams::new(file_url, file_key))
}

/// First non-empty value of `name`, if its first occurrence has one
fn query_value(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// Find the first argument that is an invocation URL for `scheme`
pub fn find_invocation_arg<I, S>(args: I, scheme: &str) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let prefix = format!("{}://", scheme);
    args.into_iter()
        .map(|arg| arg.as_ref().to_string())
        .find(|arg| arg.starts_with(&prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_form() {
        let params =
            parse_invocation("powermis://reader?file_url=https%3A%2F%2Fx%2Fa.bin&file_key=K123")
                .unwrap();
        assert_eq!(params.file_url, "https://x/a.bin");
        assert_eq!(params.file_key, "K123");
    }

    #[test]
    fn test_unencoded_file_url() {
        let params =
            parse_invocation("powermis://reader?file_url=http://x/doc&file_key=abc").unwrap();
        assert_eq!(params, InvocationParams::new("http://x/doc", "abc"));
        assert!(parse_invocation("powermis://other").is_none());
        assert!(parse_invocation("powermis://reader?file_url=http://x/doc").is_none());
    }

    #[test]
    fn test_path_forms() {
        for raw in [
            "powermis:reader?file_url=u&file_key=k",
            "powermis:///reader?file_url=u&file_key=k",
            "powermis:////reader?file_url=u&file_key=k",
        ] {
            let params = parse_invocation(raw).unwrap_or_else(|| panic!("rejected {}", raw));
            assert_eq!(params, InvocationParams::new("u", "k"));
        }
    }

    #[test]
    fn test_missing_key() {
        assert!(parse_invocation("powermis://reader?file_url=https%3A%2F%2Fx%2Fa.bin").is_none());
    }

    #[test]
    fn test_empty_values() {
        assert!(parse_invocation("powermis://reader?file_url=&file_key=k").is_none());
        assert!(parse_invocation("powermis://reader?file_url=u&file_key=").is_none());
    }

    #[test]
    fn test_wrong_target() {
        assert!(parse_invocation("powermis://other?file_url=u&file_key=k").is_none());
        assert!(parse_invocation("powermis://reader/extra?file_url=u&file_key=k").is_none());
    }

    #[test]
    fn test_not_a_url() {
        assert!(parse_invocation("").is_none());
        assert!(parse_invocation("not a url").is_none());
    }

    #[test]
    fn test_first_value_wins() {
        let params =
            parse_invocation("powermis://reader?file_url=a&file_url=b&file_key=k").unwrap();
        assert_eq!(params.file_url, "a");
    }

    #[test]
    fn test_find_invocation_arg() {
        let args = [
            "/opt/powermis/powermis",
            "--flag",
            "powermis://reader?file_url=u&file_key=k",
            "powermis://reader?file_url=v&file_key=k",
        ];
        assert_eq!(
            find_invocation_arg(args, "powermis").as_deref(),
            Some("powermis://reader?file_url=u&file_key=k")
        );
        assert!(find_invocation_arg(["powermis", "--flag"], "powermis").is_none());
        assert!(find_invocation_arg(args, "docview").is_none());
    }
}
