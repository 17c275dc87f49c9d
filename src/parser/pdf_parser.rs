use lopdf::Document;
use std::panic;
use std::path::Path;
use tracing::{info, warn};

use crate::utils::{InsightError, InsightResult};

pub struct PdfParser;

impl PdfParser {
    pub fn new() -> Self {
        Self
    }

    /// 按页序提取每页文本，无法提取的页为空字符串
    pub fn extract_pages(&self, pdf_path: &Path) -> InsightResult<Vec<String>> {
        info!("解析PDF: {}", pdf_path.display());

        if !pdf_path.exists() {
            return Err(InsightError::Pdf(format!(
                "PDF文件不存在: {}",
                pdf_path.display()
            )));
        }

        let bytes = std::fs::read(pdf_path)?;
        self.extract_pages_from_mem(&bytes)
    }

    /// 优先使用 pdf-extract 按页提取，失败时退回 lopdf
    pub fn extract_pages_from_mem(&self, bytes: &[u8]) -> InsightResult<Vec<String>> {
        let pages = match extract_with_pdf_extract(bytes) {
            Ok(pages) if !pages.is_empty() => pages,
            Ok(_) => {
                warn!("pdf-extract 未返回任何页面，改用 lopdf");
                extract_with_lopdf(bytes)?
            }
            Err(e) => {
                warn!("pdf-extract 解析失败，改用 lopdf: {}", e);
                extract_with_lopdf(bytes)?
            }
        };

        info!("成功提取 {} 页", pages.len());
        Ok(pages)
    }

    /// 提取完整文本，页之间以换行分隔
    pub fn extract_full_text(&self, pdf_path: &Path) -> InsightResult<String> {
        let text = self.extract_pages(pdf_path)?.join("\n");
        info!("提取文本长度: {} 字符", text.chars().count());
        Ok(text)
    }
}

impl Default for PdfParser {
    fn default() -> Self {
        Self::new()
    }
}

/// pdf-extract 遇到复杂PDF可能 panic，这里捕获后转为错误
fn extract_with_pdf_extract(bytes: &[u8]) -> InsightResult<Vec<String>> {
    match panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes)) {
        Ok(Ok(pages)) => Ok(pages),
        Ok(Err(e)) => Err(InsightError::Pdf(format!("无法解析PDF: {}", e))),
        Err(_) => Err(InsightError::Pdf("PDF解析器崩溃".to_string())),
    }
}

/// lopdf 不支持 Identity-H 编码，会用这个占位串代替页面文本
const LOPDF_IDENTITY_PLACEHOLDER: &str = "?Identity-H Unimplemented?";

fn extract_with_lopdf(bytes: &[u8]) -> InsightResult<Vec<String>> {
    let doc = Document::load_mem(bytes)
        .map_err(|e| InsightError::Pdf(format!("无法解析PDF: {}", e)))?;

    // get_pages 返回 BTreeMap，按页码有序
    let pages = doc
        .get_pages()
        .keys()
        .map(|&page_num| match doc.extract_text(&[page_num]) {
            Ok(text) if text.contains(LOPDF_IDENTITY_PLACEHOLDER) => {
                warn!("第 {} 页使用 Identity-H 字体，lopdf 无法解码", page_num);
                text.replace(LOPDF_IDENTITY_PLACEHOLDER, "")
            }
            Ok(text) => text,
            Err(e) => {
                warn!("第 {} 页无法提取文本: {}", page_num, e);
                String::new()
            }
        })
        .collect();

    Ok(pages)
}
