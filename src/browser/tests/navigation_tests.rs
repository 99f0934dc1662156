use super::mock::{MockTransport, browser, html};
use crate::errors::Error;
use reqwest::Method;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reload_before_open() {
        let mock = MockTransport::new();
        let bow = browser(&mock);

        assert!(matches!(bow.reload().await, Err(Error::PageNotLoaded(_))));
        assert!(matches!(bow.url().await, Err(Error::PageNotLoaded(_))));
        assert!(bow.page().await.is_none());
        assert_eq!(mock.count(), 0);
    }

    #[tokio::test]
    async fn test_open_then_back() {
        let mock = MockTransport::new();
        mock.page("http://x/1", &html("One", ""));
        mock.page("http://x/2", &html("Two", ""));
        let bow = browser(&mock);

        bow.open("http://x/1").await.unwrap();
        assert_eq!(bow.history_len().await, 0);
        bow.open("http://x/2").await.unwrap();
        assert_eq!(bow.history_len().await, 1);
        assert_eq!(bow.title().await.unwrap(), "Two");

        assert!(bow.back().await);
        assert_eq!(bow.url().await.unwrap().as_str(), "http://x/1");
        assert_eq!(bow.title().await.unwrap(), "One");
        assert!(!bow.back().await);
        assert_eq!(bow.url().await.unwrap().as_str(), "http://x/1");
    }

    #[tokio::test]
    async fn test_back_unwinds_every_navigation() {
        let mock = MockTransport::new();
        for n in 0..5 {
            mock.page(&format!("http://x/{}", n), &html(&n.to_string(), ""));
        }
        let bow = browser(&mock);

        for n in 0..5 {
            bow.open(&format!("http://x/{}", n)).await.unwrap();
        }
        for n in (0..4).rev() {
            assert!(bow.back().await);
            assert_eq!(bow.title().await.unwrap(), n.to_string());
        }
        assert!(!bow.back().await);
        assert_eq!(mock.count(), 5);
    }

    #[tokio::test]
    async fn test_failed_open_keeps_state() {
        let mock = MockTransport::new();
        mock.page("http://x/1", &html("One", ""));
        let bow = browser(&mock);

        bow.open("http://x/1").await.unwrap();
        let before = bow.page().await.unwrap();

        assert!(matches!(bow.open("http://x/missing").await, Err(Error::Io(_))));
        let after = bow.page().await.unwrap();
        assert!(std::sync::Arc::ptr_eq(&before, &after));
        assert_eq!(bow.history_len().await, 0);
    }

    #[tokio::test]
    async fn test_malformed_url_sends_nothing() {
        let mock = MockTransport::new();
        let bow = browser(&mock);

        let err = bow.open("not a url").await.unwrap_err();
        assert!(matches!(err, Error::MalformedUrl { .. }));
        assert_eq!(mock.count(), 0);
        assert!(bow.page().await.is_none());
    }

    #[tokio::test]
    async fn test_reload_replays_request() {
        let mock = MockTransport::new();
        mock.page("http://x/1", &html("One", ""));
        let bow = browser(&mock);

        bow.open("http://x/1").await.unwrap();
        bow.reload().await.unwrap();

        let requests = mock.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0], requests[1]);
        assert_eq!(bow.history_len().await, 1);
    }

    #[tokio::test]
    async fn test_reload_replays_post_body() {
        let mock = MockTransport::new();
        mock.page("http://x/submit", &html("Done", ""));
        let bow = browser(&mock);

        bow.post_form("http://x/submit", [("q", "rust lang"), ("n", "1")])
            .await
            .unwrap();
        bow.reload().await.unwrap();

        let last = mock.last();
        assert_eq!(last.method, Method::POST);
        assert_eq!(last.body.as_deref(), Some(&b"q=rust+lang&n=1"[..]));
        assert_eq!(
            last.headers.get("content-type").unwrap(),
            "application/x-www-form-urlencoded"
        );
    }

    #[tokio::test]
    async fn test_open_form_replaces_query() {
        let mock = MockTransport::new();
        mock.page("http://x/search?q=a+b", &html("Results", ""));
        let bow = browser(&mock);

        bow.open_form("http://x/search?old=1", [("q", "a b")])
            .await
            .unwrap();

        let last = mock.last();
        assert_eq!(last.method, Method::GET);
        assert_eq!(last.url.as_str(), "http://x/search?q=a+b");
        assert!(last.body.is_none());
    }

    #[tokio::test]
    async fn test_click_errors() {
        let mock = MockTransport::new();
        mock.page(
            "http://x/1",
            &html("One", r#"<p class="para">hi</p><a class="bare">no href</a>"#),
        );
        let bow = browser(&mock);

        assert!(matches!(
            bow.click("a").await,
            Err(Error::PageNotLoaded(_))
        ));

        bow.open("http://x/1").await.unwrap();
        assert!(matches!(
            bow.click("a.missing").await,
            Err(Error::ElementNotFound { .. })
        ));
        assert!(matches!(
            bow.click("p.para").await,
            Err(Error::ElementNotFound { .. })
        ));
        assert!(matches!(
            bow.click("a.bare").await,
            Err(Error::LinkNotFound { .. })
        ));
        assert!(matches!(
            bow.click("a[").await,
            Err(Error::InvalidSelector { .. })
        ));
        assert_eq!(mock.count(), 1);
        assert_eq!(bow.history_len().await, 0);
    }

    #[tokio::test]
    async fn test_click_follows_relative_link() {
        let mock = MockTransport::new();
        mock.page(
            "http://x/docs/index.html",
            &html("Index", r#"<a id="next" href="page2.html">Next</a>"#),
        );
        mock.page("http://x/docs/page2.html", &html("Page 2", ""));
        let bow = browser(&mock);

        bow.open("http://x/docs/index.html").await.unwrap();
        bow.click("#next").await.unwrap();

        assert_eq!(
            bow.url().await.unwrap().as_str(),
            "http://x/docs/page2.html"
        );
        assert_eq!(bow.title().await.unwrap(), "Page 2");
        let last = mock.last();
        assert_eq!(last.method, Method::GET);
        assert_eq!(
            last.headers.get("referer").unwrap(),
            "http://x/docs/index.html"
        );
    }

    #[tokio::test]
    async fn test_bookmarks() {
        let mock = MockTransport::new();
        mock.page("http://x/1", &html("One", ""));
        mock.page("http://x/2", &html("Two", ""));
        let bow = browser(&mock);

        assert!(matches!(
            bow.bookmark_page("first").await,
            Err(Error::PageNotLoaded(_))
        ));

        bow.open("http://x/1").await.unwrap();
        bow.bookmark_page("first").await.unwrap();
        assert!(matches!(
            bow.bookmark_page("first").await,
            Err(Error::BookmarkExists(_))
        ));

        bow.open("http://x/2").await.unwrap();
        bow.open_bookmark("first").await.unwrap();
        assert_eq!(bow.title().await.unwrap(), "One");
        assert!(matches!(
            bow.open_bookmark("nope").await,
            Err(Error::BookmarkNotFound(_))
        ));
        assert_eq!(bow.bookmarks().read("first").unwrap(), "http://x/1");
    }

    #[tokio::test]
    async fn test_page_accessors() {
        let mock = MockTransport::new();
        mock.status(
            "http://x/gallery/",
            404,
            &html(
                "Gallery",
                r#"<a href="/about">About</a><img id="cat" src="cat.png" alt="A cat">"#,
            ),
        );
        let bow = browser(&mock);
        bow.open("http://x/gallery/").await.unwrap();

        assert_eq!(bow.status_code().await.unwrap(), 404);
        assert_eq!(bow.title().await.unwrap(), "Gallery");
        assert!(bow.body().await.unwrap().contains("A cat"));
        assert_eq!(bow.find("img").await.unwrap().len(), 1);

        let links = bow.links().await.unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].href.as_str(), "http://x/about");
        assert_eq!(links[0].text, "About");

        let images = bow.images().await.unwrap();
        assert_eq!(images[0].src.as_str(), "http://x/gallery/cat.png");
        assert_eq!(images[0].alt, "A cat");

        assert_eq!(
            bow.resolve_url("../up").await.unwrap().as_str(),
            "http://x/up"
        );

        let mut out = Vec::new();
        let written = bow.download(&mut out).await.unwrap();
        assert_eq!(written, out.len() as u64);
        assert!(String::from_utf8(out).unwrap().contains("<title>Gallery</title>"));
    }

    #[tokio::test]
    async fn test_clones_share_session() {
        let mock = MockTransport::new();
        mock.page("http://x/1", &html("One", ""));
        let bow = browser(&mock);
        let other = bow.clone();

        bow.open("http://x/1").await.unwrap();
        assert_eq!(other.title().await.unwrap(), "One");
    }
}
