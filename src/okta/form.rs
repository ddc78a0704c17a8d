use scraper::{ElementRef, Html, Selector};

/// Reads the assertion from the auto-submitting form Okta renders on the app
/// link page.
pub fn extract_saml_response(doc: &Html) -> Option<String> {
    let selector = Selector::parse("input[name=\"SAMLResponse\"]").ok()?;
    let elements: Vec<ElementRef> = doc.select(&selector).collect();

    if elements.len() == 0 {
        return None;
    }

    elements[0]
        .value()
        .attr("value")
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(|v| v.into())
}

#[cfg(test)]
mod test {
    use super::*;

    const APP_PAGE: &str = r#"<!DOCTYPE html>
<html><body onload="document.forms[0].submit()">
<form id="appForm" action="https://signin.aws.amazon.com/saml" method="POST">
  <input name="SAMLResponse" type="hidden" value="PHNhbWxwOlJlc3BvbnNlPjwvc2FtbHA6UmVzcG9uc2U&#x2b;"/>
  <input name="RelayState" type="hidden" value=""/>
</form>
</body></html>"#;

    #[test]
    fn test_extract_saml_response() {
        let doc = Html::parse_document(APP_PAGE);

        assert_eq!(
            extract_saml_response(&doc).unwrap(),
            "PHNhbWxwOlJlc3BvbnNlPjwvc2FtbHA6UmVzcG9uc2U+"
        );
    }

    #[test]
    fn test_first_response_wins() {
        let doc = Html::parse_document(
            r#"<form><input name="SAMLResponse" value=" first "/><input name="SAMLResponse" value="second"/></form>"#,
        );

        assert_eq!(extract_saml_response(&doc).unwrap(), "first");
    }

    #[test]
    fn test_login_page_has_no_response() {
        let doc = Html::parse_document(
            r#"<html><form action="/login/do-login" method="post"><input name="username"/></form></html>"#,
        );

        assert!(extract_saml_response(&doc).is_none());
    }
}
