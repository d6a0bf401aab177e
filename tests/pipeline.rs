use std::fs::File;
use std::sync::Arc;

use ebook_fetcher::common::client::{HttpClient, Transport};
use ebook_fetcher::common::models::{DownloadConfig, DownloadType};
use ebook_fetcher::downloader::progress::NoopProgress;
use ebook_fetcher::downloader::{CountingProgress, DownloadCore};
use ebook_fetcher::parser::{
    EpubParser, ImageSequenceOptions, ImageSequenceParser, ParseError, Parser,
};
use ebook_fetcher::post_process::post_process;
use tempfile::tempdir;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};
use zip::ZipArchive;

/// `/img{n}.png`，编号 1..=max 存在
struct NumberedImages {
    max: u64,
}

impl Respond for NumberedImages {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let number = request
            .url
            .path()
            .trim_start_matches("/img")
            .trim_end_matches(".png")
            .parse::<u64>()
            .ok();

        match number {
            Some(n) if (1..=self.max).contains(&n) => ResponseTemplate::new(200)
                .set_body_raw(format!("image-{}", n).into_bytes(), "image/png"),
            _ => ResponseTemplate::new(404),
        }
    }
}

fn client(config: &DownloadConfig) -> Arc<dyn Transport> {
    Arc::new(HttpClient::new(config).unwrap())
}

#[tokio::test]
async fn test_image_sequence_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(path_regex(r"^/img\d+\.png$"))
        .respond_with(NumberedImages { max: 47 })
        .mount(&server)
        .await;

    let root = tempdir().unwrap();
    let output_dir = root.path().join("comic");
    std::fs::create_dir_all(&output_dir).unwrap();

    let config = DownloadConfig {
        concurrency: 4,
        ..DownloadConfig::default()
    };
    let transport = client(&config);

    let parser = ImageSequenceParser::new(
        Arc::clone(&transport),
        ImageSequenceOptions::from_config(&output_dir, &config),
    );
    let template = format!("{}/img{{:03}}.png", server.uri());
    let meta = parser.parse(&template).await.unwrap();

    assert_eq!(meta.download_type, DownloadType::ImageSequence);
    assert_eq!(meta.download_items.len(), 47);
    assert_eq!(meta.download_items[0].url, format!("{}/img001.png", server.uri()));
    assert_eq!(meta.download_items[46].output_path, output_dir.join("047.png"));

    let core = DownloadCore::from_config(transport, &config).unwrap();
    let progress = Arc::new(CountingProgress::new());
    let result = core.run(meta.download_items.clone(), progress.clone()).await;

    assert_eq!(result.succeeded, 47);
    assert!(result.all_succeeded());
    assert_eq!(progress.snapshot().finished(), 47);
    assert_eq!(
        std::fs::read_to_string(output_dir.join("013.png")).unwrap(),
        "image-13"
    );

    let archive_path = post_process(&meta, &result, &config).await.unwrap();
    let root_dir = std::fs::canonicalize(root.path()).unwrap();
    assert_eq!(archive_path, root_dir.join("comic.cbz"));
    assert!(!output_dir.exists());

    let archive = ZipArchive::new(File::open(&archive_path).unwrap()).unwrap();
    assert_eq!(archive.len(), 47);
}

#[tokio::test]
async fn test_image_sequence_with_explicit_stop() {
    let server = MockServer::start().await;
    Mock::given(path_regex(r"^/img\d+\.png$"))
        .respond_with(NumberedImages { max: 47 })
        .mount(&server)
        .await;

    let root = tempdir().unwrap();
    let config = DownloadConfig::default();
    let mut options = ImageSequenceOptions::from_config(root.path(), &config);
    options.start = 3;
    options.stop = Some(10);
    options.file_name_format = "page_{}".to_string();

    let parser = ImageSequenceParser::new(client(&config), options);
    let meta = parser
        .parse(&format!("{}/img{{:02}}.png", server.uri()))
        .await
        .unwrap();

    assert_eq!(meta.download_items.len(), 8);
    assert_eq!(meta.download_items[0].url, format!("{}/img03.png", server.uri()));
    assert_eq!(meta.download_items[0].output_path, root.path().join("page_3.png"));
}

#[tokio::test]
async fn test_image_sequence_rejects_unknown_image_type() {
    let server = MockServer::start().await;
    Mock::given(path_regex(r"^/img\d+\.gif$"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"GIF89a".to_vec(), "image/gif"))
        .mount(&server)
        .await;

    let root = tempdir().unwrap();
    let config = DownloadConfig::default();
    let mut options = ImageSequenceOptions::from_config(root.path(), &config);
    options.stop = Some(2);

    let parser = ImageSequenceParser::new(client(&config), options);
    let result = parser.parse(&format!("{}/img{{}}.gif", server.uri())).await;
    assert!(matches!(result, Err(ParseError::UnsupportedContentType(_))));
}

#[tokio::test]
async fn test_image_sequence_requires_output_dir() {
    let config = DownloadConfig::default();
    let root = tempdir().unwrap();
    let options = ImageSequenceOptions::from_config(root.path().join("missing"), &config);

    let parser = ImageSequenceParser::new(client(&config), options);
    let result = parser.parse("http://127.0.0.1:9/img{}.png").await;
    assert!(matches!(result, Err(ParseError::MissingOutputDir(_))));
}

#[tokio::test]
async fn test_epub_end_to_end() {
    let server = MockServer::start().await;
    let opf = r#"<package xmlns="http://www.idpf.org/2007/opf">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>Tiny</dc:title></metadata>
  <manifest>
    <item id="c1" href="chapter1.xhtml"/>
    <item id="img" href="images/cover.jpg"/>
  </manifest>
</package>"#;

    let files = [
        ("/book/OEBPS/content.opf", opf.as_bytes().to_vec()),
        ("/book/META-INF/container.xml", b"<container/>".to_vec()),
        ("/book/OEBPS/chapter1.xhtml", b"<html/>".to_vec()),
        ("/book/OEBPS/images/cover.jpg", b"jpeg".to_vec()),
    ];
    for (file_path, body) in files {
        Mock::given(method("GET"))
            .and(path(file_path))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
            .mount(&server)
            .await;
    }

    let root = tempdir().unwrap();
    let config = DownloadConfig::default();
    let transport = client(&config);

    let parser = EpubParser::new(Arc::clone(&transport), root.path());
    let meta = parser
        .parse(&format!("{}/book/OEBPS/content.opf", server.uri()))
        .await
        .unwrap();

    let core = DownloadCore::from_config(transport, &config).unwrap();
    let result = core.run(meta.download_items.clone(), Arc::new(NoopProgress)).await;
    assert_eq!(result.succeeded, 2);

    let archive_path = post_process(&meta, &result, &config).await.unwrap();
    let root_dir = std::fs::canonicalize(root.path()).unwrap();
    assert_eq!(archive_path, root_dir.join("Tiny.epub"));
    // 下载文件和两个描述文件都删掉后目录为空，整个目录被删除
    assert!(!meta.output_dir.exists());

    let mut archive = ZipArchive::new(File::open(&archive_path).unwrap()).unwrap();
    assert_eq!(archive.len(), 5);
    assert_eq!(archive.by_index(0).unwrap().name(), "mimetype");
}
