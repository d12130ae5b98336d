//! Lazy remote file handle / 远程文件句柄
//!
//! A handle is just a key plus a borrowed client. It never holds bytes:
//! every content accessor signs a fresh GET URL, fetches it and converts the
//! body. If signing fails nothing is fetched.

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::client::{ObjectStorage, S3Client};
use crate::config::{PresignOptions, S3Options};
use crate::download::FetchResponse;
use crate::error::{Result, S3Error};
use crate::models::{S3Stats, WriteData};
use crate::storage::ByteStream;

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Remote file handle / 远程文件句柄
pub struct S3File<'a> {
    key: String,
    client: &'a S3Client,
    options: Option<S3Options>,
}

impl<'a> S3File<'a> {
    pub(crate) fn new(key: &str, client: &'a S3Client, options: Option<S3Options>) -> Self {
        Self { key: key.to_string(), client, options }
    }

    /// Object key / 对象键
    pub fn name(&self) -> &str {
        &self.key
    }

    /// Bucket this handle resolves to / 所在存储桶
    pub fn bucket(&self) -> String {
        self.client
            .effective_options(self.overrides())
            .bucket_name()
            .to_string()
    }

    fn overrides(&self) -> Option<&S3Options> {
        self.options.as_ref()
    }

    /// Presign then fetch / 预签名后下载
    async fn open(&self) -> Result<FetchResponse> {
        let options = PresignOptions {
            overrides: self.options.clone(),
            ..Default::default()
        };
        let url = self.client.presign(&self.key, &options).await?;
        self.client.fetcher().fetch(&url).await
    }

    pub async fn text(&self) -> Result<String> {
        self.open().await?.text().await
    }

    /// Body parsed as JSON / 解析JSON
    pub async fn json<T: DeserializeOwned>(&self) -> Result<T> {
        let text = self.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    pub async fn bytes(&self) -> Result<Bytes> {
        self.open().await?.bytes().await
    }

    pub async fn array_buffer(&self) -> Result<Vec<u8>> {
        Ok(self.bytes().await?.to_vec())
    }

    /// URL-encoded form body as ordered pairs / 解析表单
    pub async fn form_data(&self) -> Result<Vec<(String, String)>> {
        let response = self.open().await?;
        if let Some(content_type) = response.content_type.as_deref() {
            let essence = content_type.split(';').next().unwrap_or("").trim();
            if !essence.eq_ignore_ascii_case(FORM_URLENCODED) {
                return Err(S3Error::Parse(format!("cannot decode {} as form data", essence)));
            }
        }
        let body = response.bytes().await?;
        Ok(url::form_urlencoded::parse(&body).into_owned().collect())
    }

    /// Raw body stream without buffering / 原始字节流（不缓冲）
    pub async fn stream(&self) -> Result<Option<ByteStream>> {
        Ok(self.open().await?.body)
    }

    pub async fn write(&self, data: impl Into<WriteData>) -> Result<u64> {
        self.client.write(&self.key, data.into(), self.overrides()).await
    }

    pub async fn delete(&self) -> Result<()> {
        self.client.delete(&self.key, self.overrides()).await
    }

    pub async fn unlink(&self) -> Result<()> {
        self.client.unlink(&self.key, self.overrides()).await
    }

    pub async fn stat(&self) -> Result<S3Stats> {
        self.client.stat(&self.key, self.overrides()).await
    }

    pub async fn size(&self) -> Result<u64> {
        self.client.size(&self.key, self.overrides()).await
    }

    /// Content type from object metadata / 内容类型
    pub async fn content_type(&self) -> Result<String> {
        Ok(self.stat().await?.content_type)
    }

    pub async fn exists(&self) -> bool {
        self.client.exists(&self.key, self.overrides()).await
    }

    /// Presign with the handle's overrides unless options carry their own / 预签名
    pub async fn presign(&self, options: PresignOptions) -> Result<String> {
        let options = match options.overrides {
            Some(_) => options,
            None => PresignOptions { overrides: self.options.clone(), ..options },
        };
        self.client.presign(&self.key, &options).await
    }
}

impl std::fmt::Debug for S3File<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3File").field("key", &self.key).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PresignMethod;
    use crate::download::Fetcher;
    use crate::storage::{Connector, HeadRecord, MemoryStore, ObjectGateway, ObjectListing};
    use async_trait::async_trait;
    use futures::StreamExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn memory_client() -> S3Client {
        let store = MemoryStore::new();
        store.create_bucket("bucket");
        store.client(S3Options::new("ak", "sk", "bucket")).unwrap()
    }

    struct NoSignGateway;

    #[async_trait]
    impl ObjectGateway for NoSignGateway {
        fn name(&self) -> &str { "nosign" }
        fn bucket(&self) -> &str { "bucket" }
        async fn put(&self, _: &str, _: Bytes, _: &str, _: Option<&str>) -> Result<()> { Ok(()) }
        async fn get(&self, _: &str) -> Result<Bytes> { Ok(Bytes::new()) }
        async fn head(&self, _: &str) -> Result<HeadRecord> { Ok(HeadRecord::default()) }
        async fn delete(&self, _: &str) -> Result<()> { Ok(()) }
        async fn list_objects(&self, _: &str, _: Option<char>) -> Result<ObjectListing> {
            Ok(ObjectListing::default())
        }
        async fn presign(&self, key: &str, _: PresignMethod, _: u32) -> Result<String> {
            Err(S3Error::presign(key, "credentials rejected"))
        }
        async fn list_buckets(&self) -> Result<Vec<String>> { Ok(vec![]) }
    }

    struct NoSignConnector;

    impl Connector for NoSignConnector {
        fn connect(&self, _: &S3Options) -> Result<Arc<dyn ObjectGateway>> {
            Ok(Arc::new(NoSignGateway))
        }
    }

    /// Counts fetches, serves a fixed body / 计数下载器
    #[derive(Default)]
    struct CountingFetcher {
        calls: AtomicUsize,
        content_type: Option<String>,
        body: Option<&'static [u8]>,
    }

    #[async_trait]
    impl Fetcher for CountingFetcher {
        async fn fetch(&self, _: &str) -> Result<FetchResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let body = self.body.map(|b| -> ByteStream {
                Box::pin(futures::stream::once(async move { Ok::<_, std::io::Error>(Bytes::from_static(b)) }))
            });
            Ok(FetchResponse::new(200, self.content_type.clone(), body))
        }
    }

    #[tokio::test]
    async fn test_presign_failure_skips_fetch() {
        let fetcher = Arc::new(CountingFetcher::default());
        let client = S3Client::with_backends(
            S3Options::new("ak", "sk", "bucket"),
            Arc::new(NoSignConnector),
            fetcher.clone(),
        )
        .unwrap();

        let file = client.file("a.txt");
        assert!(matches!(file.text().await, Err(S3Error::Presign { .. })));
        assert!(matches!(file.bytes().await, Err(S3Error::Presign { .. })));
        assert!(matches!(file.stream().await, Err(S3Error::Presign { .. })));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_credentials_skips_fetch() {
        let fetcher = Arc::new(CountingFetcher::default());
        let client = S3Client::with_backends(
            S3Options::default(),
            Arc::new(NoSignConnector),
            fetcher.clone(),
        )
        .unwrap();

        assert!(matches!(client.file("a").text().await, Err(S3Error::Configuration(_))));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_every_read_is_a_fresh_round_trip() {
        let client = memory_client();
        let file = client.file("note.txt");
        file.write("v1").await.unwrap();
        assert_eq!(file.text().await.unwrap(), "v1");

        client.write("note.txt", "v2".into(), None).await.unwrap();
        assert_eq!(file.text().await.unwrap(), "v2");
    }

    #[tokio::test]
    async fn test_json() {
        let client = memory_client();
        let file = client.file("data.json");
        assert_eq!(file.write(r#"{"hello":"world"}"#).await.unwrap(), 17);

        let value: serde_json::Value = file.json().await.unwrap();
        assert_eq!(value["hello"], "world");

        file.write("not json").await.unwrap();
        assert!(matches!(file.json::<serde_json::Value>().await, Err(S3Error::Parse(_))));
    }

    #[tokio::test]
    async fn test_bytes_and_array_buffer() {
        let client = memory_client();
        let file = client.file("bin");
        file.write(vec![0u8, 159, 146, 150]).await.unwrap();
        assert_eq!(&file.bytes().await.unwrap()[..], &[0u8, 159, 146, 150]);
        assert_eq!(file.array_buffer().await.unwrap(), vec![0u8, 159, 146, 150]);
    }

    #[tokio::test]
    async fn test_stream_is_not_buffered() {
        let client = memory_client();
        let file = client.file("large.bin");
        file.write(vec![7u8; 4096]).await.unwrap();

        let mut stream = file.stream().await.unwrap().expect("body");
        let mut total = 0;
        while let Some(chunk) = stream.next().await {
            total += chunk.unwrap().len();
        }
        assert_eq!(total, 4096);
    }

    #[tokio::test]
    async fn test_stream_without_body() {
        let client = S3Client::with_backends(
            S3Options::new("ak", "sk", "bucket"),
            Arc::new(crate::storage::MemoryConnector::default()),
            Arc::new(CountingFetcher::default()),
        )
        .unwrap();
        assert!(client.file("k").stream().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_dot_keys_read_back() {
        let client = memory_client();
        for key in [".", ".."] {
            let file = client.file(key);
            file.write(format!("content of {}", key)).await.unwrap();
            assert!(file.exists().await);
            assert_eq!(file.text().await.unwrap(), format!("content of {}", key));
        }
    }

    #[tokio::test]
    async fn test_missing_object_is_fetch_error() {
        let client = memory_client();
        assert!(matches!(client.file("nope").text().await, Err(S3Error::Fetch(_))));
    }

    #[tokio::test]
    async fn test_form_data() {
        let client = memory_client();
        let over = S3Options::default().content_type(FORM_URLENCODED);
        let file = client.file_with("form", over);
        file.write("name=Ferris&lang=rust+lang&name=Crab").await.unwrap();

        let form = file.form_data().await.unwrap();
        assert_eq!(
            form,
            vec![
                ("name".to_string(), "Ferris".to_string()),
                ("lang".to_string(), "rust lang".to_string()),
                ("name".to_string(), "Crab".to_string()),
            ]
        );

        client.write("page.html", "<p>".into(), None).await.unwrap();
        assert!(matches!(client.file("page.html").form_data().await, Err(S3Error::Parse(_))));
    }

    #[tokio::test]
    async fn test_form_data_without_content_type() {
        let fetcher = CountingFetcher {
            body: Some(&b"a=1&b=2"[..]),
            ..Default::default()
        };
        let client = S3Client::with_backends(
            S3Options::new("ak", "sk", "bucket"),
            Arc::new(crate::storage::MemoryConnector::default()),
            Arc::new(fetcher),
        )
        .unwrap();
        let form = client.file("f").form_data().await.unwrap();
        assert_eq!(form.len(), 2);
    }

    #[tokio::test]
    async fn test_delegating_methods() {
        let client = memory_client();
        let file = client.file("docs/readme.md");
        assert_eq!(file.name(), "docs/readme.md");
        assert_eq!(file.bucket(), "bucket");
        assert!(!file.exists().await);

        assert_eq!(file.write("# readme").await.unwrap(), 8);
        assert!(file.exists().await);
        assert_eq!(file.size().await.unwrap(), 8);
        assert_eq!(file.content_type().await.unwrap(), "text/markdown");
        assert_eq!(file.stat().await.unwrap().size, 8);

        let url = file.presign(PresignOptions::default().expires_in(60)).await.unwrap();
        assert!(url.contains("expires=60"));

        file.unlink().await.unwrap();
        assert!(!file.exists().await);
        file.write("again").await.unwrap();
        file.delete().await.unwrap();
        assert!(!file.exists().await);
    }

    #[tokio::test]
    async fn test_handle_overrides_route_to_other_bucket() {
        let store = MemoryStore::new();
        store.create_bucket("bucket");
        store.create_bucket("other");
        let client = store.client(S3Options::new("ak", "sk", "bucket")).unwrap();

        let file = client.file_with("k", S3Options { bucket: Some("other".into()), ..Default::default() });
        assert_eq!(file.bucket(), "other");
        file.write("x").await.unwrap();
        assert_eq!(file.text().await.unwrap(), "x");
        assert!(store.object("other", "k").is_some());
        assert!(!client.file("k").exists().await);
    }
}
