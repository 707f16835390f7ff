mod common;

use guj_extract::{docx, ExtractError};

const BODY: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document
    xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>નમસ્તે</w:t></w:r><w:r><w:t xml:space="preserve"> દુનિયા</w:t></w:r></w:p>
    <w:p/>
    <w:p><w:r><w:t>a</w:t><w:tab/><w:t>b</w:t><w:br/><w:t>c &amp; d</w:t></w:r></w:p>
    <w:tbl><w:tr><w:tc><w:p><w:r><w:t>cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>
  </w:body>
</w:document>"#;

fn docx_with(body: &str) -> Vec<u8> {
    common::zip_of(&[
        ("[Content_Types].xml", b"<Types/>".as_slice()),
        ("word/document.xml", body.as_bytes()),
    ])
}

#[test]
fn paragraphs_in_order() {
    let paras = docx::paragraphs(&docx_with(BODY)).expect("read docx");
    assert_eq!(paras, ["નમસ્તે દુનિયા", "", "a\tb\nc & d"]);
}

#[test]
fn text_joins_paragraphs_with_newlines() {
    let text = docx::extract_text(&docx_with(BODY)).expect("read docx");
    assert_eq!(text, "નમસ્તે દુનિયા\n\na\tb\nc & d");
}

#[test]
fn only_body_paragraphs_are_read() {
    let body = r#"<w:document xmlns:w="urn:w"><w:body>
        <w:p><w:r><w:t>before</w:t></w:r></w:p>
        <w:tbl><w:tr><w:tc><w:p><w:r><w:t>cell</w:t></w:r></w:p><w:p/></w:tc></w:tr></w:tbl>
        <w:p><w:r><w:t>caption</w:t><w:pict><w:txbxContent>
            <w:p><w:r><w:t>boxed</w:t><w:tab/></w:r></w:p>
        </w:txbxContent></w:pict></w:r><w:r><w:t> tail</w:t></w:r></w:p>
        <w:sdt><w:sdtContent><w:p><w:r><w:t>control</w:t></w:r></w:p></w:sdtContent></w:sdt>
    </w:body></w:document>"#;
    let paras = docx::paragraphs(&docx_with(body)).expect("read docx");
    assert_eq!(paras, ["before", "caption tail"]);
}

#[test]
fn missing_body_is_corrupt() {
    let bytes = common::zip_of(&[("readme.txt", b"hi".as_slice())]);
    assert!(matches!(
        docx::extract_text(&bytes),
        Err(ExtractError::CorruptDocument(_))
    ));
    assert!(matches!(
        docx::extract_text(b"not a zip"),
        Err(ExtractError::CorruptDocument(_))
    ));
}
