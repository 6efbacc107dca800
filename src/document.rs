//! 文档模块
//!
//! # 设计思路
//!
//! 抓取流水线与两条核心流水线之间的数据载体：一个本地可读路径 + 来源 URI。
//! 输入路径可能是本地文件、标准输入（`-`）或远程地址，远程内容需要先抓取
//! 到临时文件后才能读取。
//!
//! # 实现思路
//!
//! - 打开时只做来源识别，不触发 I/O；`fetch` 才真正下载。
//! - 临时文件由 `tempfile` 管理，随 `Document` 一起释放，失败的抓取不留残留。
//! - HTTP 下载沿用流式分块读取 + 体积上限，尽早失败。

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::NamedTempFile;
use tokio::io::AsyncReadExt;

use crate::config::FetchConfig;

const STDIN_NAME: &str = "stdin";
const TEMP_PREFIX: &str = "geh_";

/// 文档抓取错误
#[derive(Debug, Clone, thiserror::Error)]
pub enum DocumentError {
    #[error("文件错误：{0}")]
    Io(String),

    #[error("网络错误：{0}")]
    Network(String),

    #[error("超时错误：{0}")]
    Timeout(String),

    #[error("不支持的来源：{0}")]
    Unsupported(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),
}

/// 获取文档内容的方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMethod {
    Plain,
    Stdin,
    Http,
    Ftp,
}

impl FetchMethod {
    /// 根据路径识别来源类型。
    pub fn detect(path: &str) -> Self {
        let lower = path.to_ascii_lowercase();
        if path == "-" {
            Self::Stdin
        } else if lower.starts_with("http://") || lower.starts_with("https://") {
            Self::Http
        } else if lower.contains("ftp://") {
            Self::Ftp
        } else {
            Self::Plain
        }
    }
}

/// 待处理文档：本地路径 + 来源 URI。
#[derive(Debug)]
pub struct Document {
    source: String,
    uri: String,
    method: FetchMethod,
    fetched: Option<NamedTempFile>,
}

impl Document {
    /// 打开文档，仅识别来源，不做 I/O。
    pub fn open(path: impl Into<String>) -> Self {
        let source = path.into();
        let method = FetchMethod::detect(&source);
        let uri = build_uri(&source, method);

        Self {
            source,
            uri,
            method,
            fetched: None,
        }
    }

    /// 以已知来源地址包装一个本地文件（例如外部抓取器已下载的内容）。
    pub fn with_origin(path: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            source: path.into(),
            uri: uri.into(),
            method: FetchMethod::Plain,
            fetched: None,
        }
    }

    pub fn method(&self) -> FetchMethod {
        self.method
    }

    /// 来源 URI。
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// 可读取的本地路径：已抓取时为临时文件，否则为原始路径。
    pub fn path(&self) -> &Path {
        match &self.fetched {
            Some(tmp) => tmp.path(),
            None => Path::new(&self.source),
        }
    }

    /// 文件名（标准输入固定为 `stdin`）。
    pub fn name(&self) -> &str {
        if self.method == FetchMethod::Stdin {
            return STDIN_NAME;
        }
        self.source
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(&self.source)
    }

    /// 是否还需要抓取才能读取。
    pub fn needs_fetch(&self) -> bool {
        self.method != FetchMethod::Plain && self.fetched.is_none()
    }

    /// 抓取远程或标准输入内容到临时文件。已抓取过时直接返回。
    pub async fn fetch(&mut self, config: &FetchConfig) -> Result<(), DocumentError> {
        if !self.needs_fetch() {
            return Ok(());
        }

        let bytes = match self.method {
            FetchMethod::Http => download(&self.source, config).await?,
            FetchMethod::Stdin => read_stdin(config).await?,
            FetchMethod::Ftp => {
                return Err(DocumentError::Unsupported(format!(
                    "暂不支持 FTP 抓取：{}",
                    self.source
                )));
            }
            FetchMethod::Plain => return Ok(()),
        };

        let mut tmp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile()
            .map_err(|e| DocumentError::Io(format!("无法创建临时文件：{}", e)))?;
        tmp.write_all(&bytes)
            .and_then(|_| tmp.flush())
            .map_err(|e| DocumentError::Io(format!("写入临时文件失败：{}", e)))?;

        log::debug!(
            "📥 已抓取 {}（{} bytes）-> {}",
            self.uri,
            bytes.len(),
            tmp.path().display()
        );
        self.fetched = Some(tmp);

        Ok(())
    }
}

fn build_uri(path: &str, method: FetchMethod) -> String {
    match method {
        FetchMethod::Stdin => STDIN_NAME.to_string(),
        FetchMethod::Http | FetchMethod::Ftp => path.to_string(),
        FetchMethod::Plain => {
            if let Some(rest) = path.strip_prefix('~') {
                let home = std::env::var_os("HOME")
                    .map(PathBuf::from)
                    .unwrap_or_default();
                format!("file://{}{}", home.display(), rest)
            } else if path.starts_with('/') {
                format!("file://{}", path)
            } else {
                match std::env::current_dir() {
                    Ok(cwd) => format!("file://{}/{}", cwd.display(), path),
                    Err(_) => format!("file://{}", path),
                }
            }
        }
    }
}

async fn download(url: &str, config: &FetchConfig) -> Result<Vec<u8>, DocumentError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.download_timeout))
        .connect_timeout(Duration::from_secs(config.connect_timeout))
        .build()
        .map_err(|e| DocumentError::Network(format!("无法创建 HTTP 客户端：{}", e)))?;

    log::info!("🌐 开始下载 - URL: {}", url);

    let mut response = client
        .get(url)
        .header(reqwest::header::USER_AGENT, config.user_agent.as_str())
        .send()
        .await
        .map_err(|e| map_reqwest_error(e, config))?;

    if !response.status().is_success() {
        return Err(DocumentError::Network(format!(
            "HTTP {}：{}",
            response.status().as_u16(),
            url
        )));
    }

    if let Some(len) = response.content_length() {
        if len > config.max_file_size {
            return Err(too_large(len, config.max_file_size));
        }
    }

    let mut buffer = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| map_reqwest_error(e, config))?
    {
        if (buffer.len() + chunk.len()) as u64 > config.max_file_size {
            return Err(too_large((buffer.len() + chunk.len()) as u64, config.max_file_size));
        }
        buffer.extend_from_slice(&chunk);
    }

    log::debug!("✅ 下载完成 - {} bytes", buffer.len());
    Ok(buffer)
}

async fn read_stdin(config: &FetchConfig) -> Result<Vec<u8>, DocumentError> {
    let mut buffer = Vec::new();
    tokio::io::stdin()
        .take(config.max_file_size.saturating_add(1))
        .read_to_end(&mut buffer)
        .await
        .map_err(|e| DocumentError::Io(format!("读取标准输入失败：{}", e)))?;

    if buffer.len() as u64 > config.max_file_size {
        return Err(too_large(buffer.len() as u64, config.max_file_size));
    }
    Ok(buffer)
}

fn map_reqwest_error(err: reqwest::Error, config: &FetchConfig) -> DocumentError {
    if err.is_timeout() {
        DocumentError::Timeout(format!("下载超时（{}秒）", config.download_timeout))
    } else if err.is_connect() {
        DocumentError::Network(format!("无法连接：{}", err))
    } else {
        DocumentError::Network(format!("请求失败：{}", err))
    }
}

fn too_large(size: u64, limit: u64) -> DocumentError {
    DocumentError::ResourceLimit(format!(
        "文件过大：{:.2} MB（限制：{:.2} MB）",
        size as f64 / 1024.0 / 1024.0,
        limit as f64 / 1024.0 / 1024.0
    ))
}
