use super::mock::{MockTransport, browser, html};
use crate::browser::Target;
use crate::errors::Error;
use reqwest::Method;

#[cfg(test)]
mod tests {
    use super::*;

    const SIGNUP: &str = r#"
        <form id="signup" method="post" action="/register">
            <input type="text" name="user" value="guest">
            <input type="password" name="pass">
            <input type="hidden" name="token" value="t0k">
            <input type="checkbox" name="news" checked>
            <input type="checkbox" name="spam" value="yes">
            <input type="radio" name="plan" value="free">
            <input type="radio" name="plan" value="pro" checked>
            <select name="lang">
                <option value="en">English</option>
                <option value="fr" selected>French</option>
            </select>
            <textarea name="bio">Hello</textarea>
            <input type="submit" name="go" value="Sign up">
            <button type="submit" name="later" value="1">Later</button>
        </form>
        <form id="search">
            <input name="q" value="">
        </form>
        <div id="box"></div>
    "#;

    async fn loaded() -> (std::sync::Arc<MockTransport>, crate::Browser) {
        let mock = MockTransport::new();
        mock.page("http://x/signup/", &html("Sign up", SIGNUP));
        mock.page("http://x/register", &html("Welcome", ""));
        mock.page("http://x/signup/?q=rust+crates", &html("Found", ""));
        let bow = browser(&mock);
        bow.open("http://x/signup/").await.unwrap();
        (mock, bow)
    }

    #[tokio::test]
    async fn test_form_lookup_errors() {
        let mock = MockTransport::new();
        let bow = browser(&mock);
        assert!(matches!(
            bow.form("form").await,
            Err(Error::PageNotLoaded(_))
        ));
        assert!(bow.forms().await.is_empty());

        let (_mock, bow) = loaded().await;
        assert!(matches!(
            bow.form("#nothing").await,
            Err(Error::ElementNotFound { .. })
        ));
        assert!(matches!(
            bow.form("#box").await,
            Err(Error::ElementNotFound { .. })
        ));
        assert_eq!(bow.forms().await.len(), 2);
    }

    #[tokio::test]
    async fn test_form_fields() {
        let (_mock, bow) = loaded().await;
        let form = bow.form("#signup").await.unwrap();

        assert_eq!(form.method(), Method::POST);
        assert_eq!(form.action().as_str(), "http://x/register");
        assert_eq!(form.value("user"), Some("guest"));
        assert_eq!(form.value("pass"), Some(""));
        assert_eq!(form.value("token"), Some("t0k"));
        assert_eq!(form.value("news"), Some("on"));
        assert_eq!(form.value("spam"), None);
        assert_eq!(form.value("plan"), Some("pro"));
        assert_eq!(form.value("lang"), Some("fr"));
        assert_eq!(form.value("bio"), Some("Hello"));
        assert_eq!(form.value("go"), None);
        assert_eq!(
            form.buttons(),
            &[
                ("go".to_string(), "Sign up".to_string()),
                ("later".to_string(), "1".to_string())
            ]
        );

        let search = bow.form("#search").await.unwrap();
        assert_eq!(search.method(), Method::GET);
        assert_eq!(search.action().as_str(), "http://x/signup/");
    }

    #[tokio::test]
    async fn test_submit_post() {
        let (mock, bow) = loaded().await;
        let mut form = bow.form("#signup").await.unwrap();
        form.input("user", "alice").unwrap();
        form.input("pass", "s3cret").unwrap();
        assert!(matches!(
            form.input("missing", "x"),
            Err(Error::ElementNotFound { .. })
        ));

        form.submit().await.unwrap();

        let last = mock.last();
        assert_eq!(last.method, Method::POST);
        assert_eq!(last.url.as_str(), "http://x/register");
        assert_eq!(
            String::from_utf8(last.body.unwrap()).unwrap(),
            "user=alice&pass=s3cret&token=t0k&news=on&plan=pro&lang=fr&bio=Hello"
        );
        assert_eq!(last.headers.get("referer").unwrap(), "http://x/signup/");
        assert_eq!(bow.title().await.unwrap(), "Welcome");
        assert_eq!(bow.history_len().await, 1);
    }

    #[tokio::test]
    async fn test_click_button() {
        let (mock, bow) = loaded().await;
        let form = bow.form("#signup").await.unwrap();

        assert!(matches!(
            form.click("nope").await,
            Err(Error::ElementNotFound { .. })
        ));
        assert_eq!(mock.count(), 1);

        form.click("later").await.unwrap();
        let body = String::from_utf8(mock.last().body.unwrap()).unwrap();
        assert!(body.ends_with("&later=1"));
        assert!(!body.contains("go="));
    }

    #[tokio::test]
    async fn test_submit_get() {
        let (mock, bow) = loaded().await;
        let mut form = bow.form("#search").await.unwrap();
        form.input("q", "rust crates").unwrap();
        form.submit().await.unwrap();

        let last = mock.last();
        assert_eq!(last.method, Method::GET);
        assert_eq!(last.url.as_str(), "http://x/signup/?q=rust+crates");
        assert!(last.body.is_none());
        assert_eq!(bow.title().await.unwrap(), "Found");
    }

    #[tokio::test]
    async fn test_targets() {
        let (mock, bow) = loaded().await;
        mock.page("http://x/img/a.png", "PNGDATA");
        mock.page("http://x/about", &html("About", ""));

        let form = bow.form("#search").await.unwrap();
        let mut out = Vec::new();
        let written = bow
            .download_target(&Target::from(form), &mut out)
            .await
            .unwrap();
        assert_eq!(written, out.len() as u64);
        assert!(String::from_utf8(out).unwrap().starts_with("<form"));
        assert_eq!(mock.count(), 1);

        let image = crate::Image {
            id: String::new(),
            src: bow.resolve_url("/img/a.png").await.unwrap(),
            alt: String::new(),
            title: String::new(),
        };
        let mut out = Vec::new();
        bow.download_target(&Target::from(image), &mut out)
            .await
            .unwrap();
        assert_eq!(out, b"PNGDATA");
        assert_eq!(bow.title().await.unwrap(), "Sign up");

        let link = crate::Link {
            id: String::new(),
            href: bow.resolve_url("/about").await.unwrap(),
            text: "About".into(),
        };
        bow.activate(&Target::from(link)).await.unwrap();
        assert_eq!(bow.title().await.unwrap(), "About");
        assert_eq!(mock.last().headers.get("referer").unwrap(), "http://x/signup/");
    }

    #[tokio::test]
    async fn test_disabled_controls_are_not_submitted() {
        let mock = MockTransport::new();
        mock.page(
            "http://x/prefs",
            &html(
                "Prefs",
                r#"<form id="prefs" method="post" action="/save">
                    <input name="name" value="bob">
                    <input name="locked" value="x" disabled>
                    <textarea name="notes" disabled>old</textarea>
                    <select name="size">
                        <option value="s" disabled selected>Small</option>
                        <option value="m">Medium</option>
                    </select>
                    <select name="gone" disabled><option value="1">One</option></select>
                    <button type="submit" name="off" value="1" disabled>Off</button>
                    <button type="submit" name="save" value="1">Save</button>
                </form>"#,
            ),
        );
        mock.page("http://x/save", &html("Saved", ""));
        let bow = browser(&mock);
        bow.open("http://x/prefs").await.unwrap();

        let form = bow.form("#prefs").await.unwrap();
        assert_eq!(
            form.fields(),
            &[
                ("name".to_string(), "bob".to_string()),
                ("size".to_string(), "m".to_string())
            ]
        );
        assert_eq!(form.buttons(), &[("save".to_string(), "1".to_string())]);

        form.click("save").await.unwrap();
        assert_eq!(
            String::from_utf8(mock.last().body.unwrap()).unwrap(),
            "name=bob&size=m&save=1"
        );
    }

    #[tokio::test]
    async fn test_forms_skips_unresolvable_action() {
        let mock = MockTransport::new();
        mock.page(
            "http://x/mixed",
            &html(
                "Mixed",
                r#"<form id="broken" action="http://[bad"></form><form id="fine" action="/ok"></form>"#,
            ),
        );
        let bow = browser(&mock);
        bow.open("http://x/mixed").await.unwrap();

        let forms = bow.forms().await;
        assert_eq!(forms.len(), 1);
        assert_eq!(forms[0].action().as_str(), "http://x/ok");
        assert!(matches!(
            bow.form("#broken").await,
            Err(Error::MalformedUrl { .. })
        ));
    }
}
