//! 单元测试共用的测试夹具：生成小型PDF，以及模拟的摘要服务

use axum::{
    http::{header, StatusCode},
    routing::post,
    Router,
};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::collections::BTreeMap;
use std::time::Duration;

/// 每个元素生成一页；`None` 表示该页没有内容流
pub fn build_pdf(pages: &[Option<&str>]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });

    let contents: Vec<Option<Object>> = pages
        .iter()
        .copied()
        .map(|text| text.map(Object::string_literal))
        .collect();

    finish_document(doc, pages_id, font_id, &contents)
}

/// 单页PDF，使用 Type0/Identity-H 字体并附带 ToUnicode CMap，
/// 这是 Word、LaTeX 导出文件最常见的字体编码
pub fn build_identity_pdf(text: &str) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    // 每个不同字符分配一个双字节 CID，从 1 开始
    let mut cids: BTreeMap<char, u16> = BTreeMap::new();
    let mut encoded = Vec::new();
    for ch in text.chars() {
        let next = cids.len() as u16 + 1;
        let cid = *cids.entry(ch).or_insert(next);
        encoded.extend_from_slice(&cid.to_be_bytes());
    }

    let mut cmap = String::from(
        "/CIDInit /ProcSet findresource begin\n\
         12 dict begin\n\
         begincmap\n\
         /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
         /CMapName /Adobe-Identity-UCS def\n\
         /CMapType 2 def\n\
         1 begincodespacerange\n\
         <0000> <FFFF>\n\
         endcodespacerange\n",
    );
    cmap.push_str(&format!("{} beginbfchar\n", cids.len()));
    for (ch, cid) in &cids {
        cmap.push_str(&format!("<{:04X}> <{:04X}>\n", cid, *ch as u32));
    }
    cmap.push_str(
        "endbfchar\n\
         endcmap\n\
         CMapName currentdict /CMap defineresource pop\n\
         end\n\
         end\n",
    );
    let to_unicode_id = doc.add_object(Stream::new(dictionary! {}, cmap.into_bytes()));

    let descriptor_id = doc.add_object(dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => "InsightSans",
        "Flags" => 32,
        "FontBBox" => vec![0.into(), (-200).into(), 1000.into(), 900.into()],
        "ItalicAngle" => 0,
        "Ascent" => 900,
        "Descent" => -200,
        "CapHeight" => 700,
        "StemV" => 80,
    });
    let cid_font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "CIDFontType2",
        "BaseFont" => "InsightSans",
        "CIDSystemInfo" => dictionary! {
            "Registry" => Object::string_literal("Adobe"),
            "Ordering" => Object::string_literal("Identity"),
            "Supplement" => 0,
        },
        "FontDescriptor" => descriptor_id,
        "DW" => 1000,
    });
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => "InsightSans",
        "Encoding" => "Identity-H",
        "DescendantFonts" => vec![cid_font_id.into()],
        "ToUnicode" => to_unicode_id,
    });

    let contents = vec![Some(Object::String(encoded, StringFormat::Hexadecimal))];
    finish_document(doc, pages_id, font_id, &contents)
}

/// 组装页树和目录，所有页共用字体 F1
fn finish_document(
    mut doc: Document,
    pages_id: ObjectId,
    font_id: ObjectId,
    contents: &[Option<Object>],
) -> Vec<u8> {
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for shown in contents {
        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Resources" => resources_id,
        };

        if let Some(shown) = shown {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![shown.clone()]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            page.set("Contents", content_id);
        }

        let page_id = doc.add_object(page);
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// 模拟 `POST /chat/completions`，返回固定状态码和原始响应体；返回基础URL
pub async fn spawn_provider(status: StatusCode, body: &str) -> String {
    spawn_delayed_provider(Duration::ZERO, status, body).await
}

/// 与 `spawn_provider` 相同，但先等待 `delay` 再响应，用于超时测试
pub async fn spawn_delayed_provider(delay: Duration, status: StatusCode, body: &str) -> String {
    let body = body.to_string();
    let handler = move || {
        let body = body.clone();
        async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            (status, [(header::CONTENT_TYPE, "application/json")], body)
        }
    };
    let app = Router::new().route("/chat/completions", post(handler));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}
