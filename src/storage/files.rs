use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

use crate::utils::InsightResult;

/// 已写入磁盘的上传文件
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub filename: String,
    pub path: PathBuf,
}

/// 上传文件目录，文件名为随机UUID加原扩展名
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub async fn new(dir: impl Into<PathBuf>) -> InsightResult<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> InsightResult<StoredFile> {
        let filename = generate_filename(original_name);
        let path = self.dir.join(&filename);

        tokio::fs::write(&path, bytes).await?;
        info!("文件已保存: {} ({} 字节)", path.display(), bytes.len());

        Ok(StoredFile { filename, path })
    }

    pub async fn remove(&self, path: &Path) {
        if let Err(e) = tokio::fs::remove_file(path).await {
            warn!("删除文件失败 {}: {}", path.display(), e);
        }
    }
}

fn generate_filename(original_name: &str) -> String {
    let ext = Path::new(original_name)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    format!("{}{}", Uuid::new_v4(), ext)
}
