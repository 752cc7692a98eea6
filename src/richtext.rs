use serde_json::{json, Value};

use crate::parser::blocks::ContentBlock;

/// How many leading children of an existing document to scan when deciding
/// whether the hero upload is already present.
const LEADING_MEDIA_WINDOW: usize = 8;

/// Build a Lexical editor-state document from ordered content blocks.
///
/// Empty input yields a document with a single empty paragraph, which is what
/// the CMS editor expects instead of an empty children array.
pub fn document_from_blocks(blocks: &[ContentBlock]) -> Value {
    let mut children: Vec<Value> = blocks.iter().map(block_node).collect();
    if children.is_empty() {
        children.push(paragraph_node(&[]));
    }
    json!({
        "root": {
            "type": "root",
            "format": "",
            "indent": 0,
            "version": 1,
            "direction": "ltr",
            "children": children,
        }
    })
}

/// Insert an upload node for `media_id` at the top of the document, unless
/// one of the first few children already references the same media.
pub fn prepend_media(doc: &mut Value, media_id: i64) {
    let Some(children) = doc
        .pointer_mut("/root/children")
        .and_then(Value::as_array_mut)
    else {
        return;
    };
    let already_there = children.iter().take(LEADING_MEDIA_WINDOW).any(|child| {
        child.get("type").and_then(Value::as_str) == Some("upload")
            && child.get("value").and_then(Value::as_i64) == Some(media_id)
    });
    if already_there {
        return;
    }
    children.insert(0, upload_node(media_id));
}

fn block_node(block: &ContentBlock) -> Value {
    match block {
        ContentBlock::Heading { text } => json!({
            "type": "heading",
            "tag": "h2",
            "format": "",
            "indent": 0,
            "version": 1,
            "direction": "ltr",
            "children": [text_node(text)],
        }),
        ContentBlock::Paragraph { text } => paragraph_node(&[text_node(text)]),
        ContentBlock::Link { href, text } => paragraph_node(&[json!({
            "type": "link",
            "fields": { "url": href, "newTab": false, "linkType": "custom" },
            "format": "",
            "indent": 0,
            "version": 2,
            "direction": "ltr",
            "children": [text_node(text)],
        })]),
        ContentBlock::List { items } => json!({
            "type": "list",
            "listType": "bullet",
            "tag": "ul",
            "start": 1,
            "format": "",
            "indent": 0,
            "version": 1,
            "direction": "ltr",
            "children": items
                .iter()
                .enumerate()
                .map(|(i, item)| json!({
                    "type": "listitem",
                    "value": i + 1,
                    "format": "",
                    "indent": 0,
                    "version": 1,
                    "direction": "ltr",
                    "children": [text_node(item)],
                }))
                .collect::<Vec<_>>(),
        }),
    }
}

fn paragraph_node(children: &[Value]) -> Value {
    json!({
        "type": "paragraph",
        "format": "",
        "indent": 0,
        "version": 1,
        "direction": "ltr",
        "children": children,
    })
}

fn text_node(text: &str) -> Value {
    json!({
        "type": "text",
        "text": text,
        "format": 0,
        "style": "",
        "mode": "normal",
        "detail": 0,
        "version": 1,
    })
}

fn upload_node(media_id: i64) -> Value {
    json!({
        "type": "upload",
        "relationTo": "media",
        "value": media_id,
        "format": "",
        "version": 2,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_blocks_yield_single_empty_paragraph() {
        let doc = document_from_blocks(&[]);
        let children = doc.pointer("/root/children").unwrap().as_array().unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0]["type"], "paragraph");
        assert!(children[0]["children"].as_array().unwrap().is_empty());
    }

    #[test]
    fn blocks_map_to_lexical_nodes() {
        let blocks = vec![
            ContentBlock::Heading { text: "Our Work".into() },
            ContentBlock::Paragraph { text: "We distribute relief.".into() },
            ContentBlock::List { items: vec!["rice".into(), "water".into()] },
            ContentBlock::Link {
                href: "https://zcfindia.org/donate/".into(),
                text: "Donate".into(),
            },
        ];
        let doc = document_from_blocks(&blocks);
        let children = doc.pointer("/root/children").unwrap().as_array().unwrap();
        assert_eq!(children.len(), 4);
        assert_eq!(children[0]["type"], "heading");
        assert_eq!(children[0]["tag"], "h2");
        assert_eq!(children[1]["children"][0]["text"], "We distribute relief.");
        assert_eq!(children[2]["listType"], "bullet");
        assert_eq!(children[2]["children"].as_array().unwrap().len(), 2);
        assert_eq!(children[3]["children"][0]["type"], "link");
        assert_eq!(
            children[3]["children"][0]["fields"]["url"],
            "https://zcfindia.org/donate/"
        );
    }

    #[test]
    fn prepend_media_inserts_upload_first() {
        let mut doc = document_from_blocks(&[ContentBlock::Paragraph { text: "x".into() }]);
        prepend_media(&mut doc, 42);
        let children = doc.pointer("/root/children").unwrap().as_array().unwrap();
        assert_eq!(children[0]["type"], "upload");
        assert_eq!(children[0]["value"], 42);
        assert_eq!(children.len(), 2);
    }

    #[test]
    fn prepend_media_is_idempotent() {
        let mut doc = document_from_blocks(&[ContentBlock::Paragraph { text: "x".into() }]);
        prepend_media(&mut doc, 42);
        prepend_media(&mut doc, 42);
        let children = doc.pointer("/root/children").unwrap().as_array().unwrap();
        assert_eq!(children.len(), 2);
    }

    #[test]
    fn prepend_media_allows_different_media() {
        let mut doc = document_from_blocks(&[]);
        prepend_media(&mut doc, 1);
        prepend_media(&mut doc, 2);
        let children = doc.pointer("/root/children").unwrap().as_array().unwrap();
        assert_eq!(children[0]["value"], 2);
        assert_eq!(children[1]["value"], 1);
    }
}
