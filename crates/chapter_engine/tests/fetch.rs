use std::collections::BTreeMap;
use std::time::Duration;

use chapter_engine::{
    is_branding_asset, FailureKind, FetchContext, FetchSettings, ImageFetcher,
    ReqwestImageFetcher,
};
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([120, 130, 140]));
    let mut buf = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, image::ImageFormat::Png)
        .expect("encode fixture png");
    buf.into_inner()
}

fn session_cookies() -> BTreeMap<String, String> {
    BTreeMap::from([("session".to_string(), "abc".to_string())])
}

#[tokio::test]
async fn fetcher_decodes_image_and_sends_session_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pages/001.png"))
        .and(header("Referer", "https://example.com/chapter/12"))
        .and(header("Cookie", "session=abc"))
        .and(header_exists("User-Agent"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(png_bytes(600, 900), "image/png"))
        .mount(&server)
        .await;

    let fetcher = ReqwestImageFetcher::new(FetchSettings::default());
    let context = FetchContext::new("https://example.com/chapter/12", session_cookies());
    let url = format!("{}/pages/001.png", server.uri());

    let fetched = fetcher
        .fetch(&url, &context)
        .await
        .expect("fetch ok")
        .expect("eligible location");
    assert_eq!(fetched.location, url);
    assert_eq!((fetched.width, fetched.height), (600, 900));
}

#[tokio::test]
async fn branding_assets_are_skipped_without_a_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/static/logo.png"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let fetcher = ReqwestImageFetcher::new(FetchSettings::default());
    let context = FetchContext::new(server.uri(), BTreeMap::new());
    let url = format!("{}/static/logo.png", server.uri());

    let result = fetcher.fetch(&url, &context).await.expect("skip is not an error");
    assert!(result.is_none());
    assert!(is_branding_asset("https://cdn.example.com/brand/banner.jpg"));

    server.verify().await;
}

#[tokio::test]
async fn fetcher_fails_on_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pages/missing.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fetcher = ReqwestImageFetcher::new(FetchSettings::default());
    let context = FetchContext::new(server.uri(), BTreeMap::new());
    let url = format!("{}/pages/missing.png", server.uri());

    let err = fetcher.fetch(&url, &context).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(404));
}

#[tokio::test]
async fn fetcher_times_out_on_slow_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pages/slow.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_raw(png_bytes(10, 10), "image/png"),
        )
        .mount(&server)
        .await;

    let settings = FetchSettings {
        request_timeout: Duration::from_millis(50),
        ..FetchSettings::default()
    };
    let fetcher = ReqwestImageFetcher::new(settings);
    let context = FetchContext::new(server.uri(), BTreeMap::new());
    let url = format!("{}/pages/slow.png", server.uri());

    let err = fetcher.fetch(&url, &context).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn non_image_payload_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pages/interstitial"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html>bot check</html>", "text/html"))
        .mount(&server)
        .await;

    let fetcher = ReqwestImageFetcher::new(FetchSettings::default());
    let context = FetchContext::new(server.uri(), BTreeMap::new());
    let url = format!("{}/pages/interstitial", server.uri());

    let err = fetcher.fetch(&url, &context).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Decode);
}

#[tokio::test]
async fn user_agent_is_drawn_from_the_pool() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pages/001.png"))
        .and(header("User-Agent", "test-agent/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(png_bytes(10, 10), "image/png"))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = ReqwestImageFetcher::new(FetchSettings::default());
    let context = FetchContext::new(server.uri(), BTreeMap::new())
        .with_user_agents(vec!["test-agent/1.0".to_string()]);
    let url = format!("{}/pages/001.png", server.uri());

    fetcher
        .fetch(&url, &context)
        .await
        .expect("fetch ok")
        .expect("eligible location");
    server.verify().await;
}
