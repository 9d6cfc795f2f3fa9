use std::collections::BTreeMap;
use std::fs;
use std::time::{Duration, Instant};

use chapter_engine::{
    ArchiveSettings, ChapterInput, PageStatus, PipelineHandle, PipelineSettings, RunEvent,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([120, 130, 140]));
    let mut buf = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, image::ImageFormat::Png)
        .expect("encode fixture png");
    buf.into_inner()
}

#[tokio::test]
async fn handle_runs_a_chapter_and_reports_completion() {
    pack_logging::initialize_for_tests();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/p/one.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(png_bytes(800, 1000), "image/png"))
        .mount(&server)
        .await;

    let temp = tempfile::TempDir::new().unwrap();
    let stage = temp.path().join("staging");
    fs::create_dir(&stage).unwrap();
    let settings = PipelineSettings {
        archive: ArchiveSettings {
            output_root: temp.path().join("out"),
        },
        staging_root: Some(stage.clone()),
        ..PipelineSettings::default()
    };

    let handle = PipelineHandle::new(settings);
    handle.submit(ChapterInput {
        title: "Sample Work".to_string(),
        chapter_tag: "7".to_string(),
        referer: format!("{}/chapters/7", server.uri()),
        cookies: BTreeMap::new(),
        locations: vec![format!("{}/p/one.png", server.uri())],
    });

    let deadline = Instant::now() + Duration::from_secs(30);
    let mut events = Vec::new();
    let result = loop {
        if let Some(event) = handle.try_recv() {
            if let RunEvent::Completed { result } = event {
                break result;
            }
            events.push(event);
            continue;
        }
        assert!(Instant::now() < deadline, "no completion event");
        tokio::time::sleep(Duration::from_millis(20)).await;
    };

    let summary = result.expect("run ok");
    assert_eq!(summary.accepted, 1);
    assert!(summary.archive_path.exists());
    assert!(events.iter().any(|event| matches!(
        event,
        RunEvent::Page {
            status: PageStatus::Accepted { sequence: 1, .. },
            ..
        }
    )));
    // Staging for the run is gone by completion time.
    assert_eq!(fs::read_dir(&stage).unwrap().count(), 0);
}
