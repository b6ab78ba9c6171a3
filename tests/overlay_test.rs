use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use pdf_overlay::{
    Compositor, LayoutPage, OverlayError, Rect, Template, content_stream, overlay_document,
    plain_bytes,
};

/// A document whose pages have the given sizes, each with one content
/// stream and a Helvetica font resource.
fn target_doc(sizes: &[(f32, f32)]) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let mut kids = Vec::new();
    for (i, (w, h)) in sizes.iter().enumerate() {
        let text = format!("BT /F1 10 Tf 72 72 Td (page {i}) Tj ET\n");
        let contents = doc.add_object(content_stream(&text).unwrap());
        let page = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => Rect::new(0.0, 0.0, *w, *h).to_object(),
            "Contents" => contents,
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font } },
        });
        kids.push(Object::Reference(page));
    }
    finish_doc(doc, pages_id, kids, Dictionary::new())
}

fn finish_doc(
    mut doc: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
    extra: Dictionary,
) -> Document {
    let mut pages = dictionary! {
        "Type" => "Pages",
        "Count" => kids.len() as i64,
        "Kids" => kids,
    };
    for (key, value) in extra.iter() {
        pages.set(key.clone(), value.clone());
    }
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog);
    doc
}

/// A 200x100 overlay page drawn from two streams with its own font.
fn overlay_source() -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let line = doc.add_object(Stream::new(Dictionary::new(), b"0 0 m 200 100 l S\n".to_vec()));
    let text = doc.add_object(content_stream("BT /F1 8 Tf (stamp) Tj ET\n").unwrap());
    let page = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => Rect::new(0.0, 0.0, 200.0, 100.0).to_object(),
        "Contents" => vec![Object::Reference(line), Object::Reference(text)],
        "Resources" => dictionary! { "Font" => dictionary! { "F1" => font } },
    });
    finish_doc(doc, pages_id, vec![page.into()], Dictionary::new())
}

fn page_ids(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().values().copied().collect()
}

fn contents_of(doc: &Document, page: ObjectId) -> Vec<ObjectId> {
    let dict = doc.get_object(page).unwrap().as_dict().unwrap();
    dict.get(b"Contents")
        .unwrap()
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o.as_reference().unwrap())
        .collect()
}

fn stream_text(doc: &Document, id: ObjectId) -> String {
    let stream = doc.get_object(id).unwrap().as_stream().unwrap();
    String::from_utf8(plain_bytes(stream).unwrap()).unwrap()
}

fn x_objects(doc: &Document, page: ObjectId) -> Dictionary {
    let dict = doc.get_object(page).unwrap().as_dict().unwrap();
    let resources = dict.get(b"Resources").unwrap().as_dict().unwrap();
    resources.get(b"XObject").unwrap().as_dict().unwrap().clone()
}

#[test]
fn content_list_wraps_original_and_appends_placement() {
    let mut doc = target_doc(&[(600.0, 800.0)]);
    let page = page_ids(&doc)[0];
    let original = contents_of_single(&doc, page);
    let overlay = LayoutPage::from_first_page(&overlay_source()).unwrap();

    overlay_document(&mut doc, &overlay).unwrap();

    let contents = contents_of(&doc, page);
    assert_eq!(contents.len(), 4);
    assert_eq!(stream_text(&doc, contents[0]), "q\n");
    assert_eq!(contents[1], original);
    assert_eq!(stream_text(&doc, contents[2]), "Q\n");
    assert_eq!(
        stream_text(&doc, contents[3]),
        "q\nq 1 0 0 1 200.0 350.0 cm /OL1 Do Q\nQ\n"
    );
    for id in &contents {
        let stream = doc.get_object(*id).unwrap().as_stream().unwrap();
        assert!(stream.dict.has(b"Filter"));
    }
}

fn contents_of_single(doc: &Document, page: ObjectId) -> ObjectId {
    let dict = doc.get_object(page).unwrap().as_dict().unwrap();
    dict.get(b"Contents").unwrap().as_reference().unwrap()
}

#[test]
fn every_page_has_balanced_state_operators() {
    let mut doc = target_doc(&[(612.0, 792.0), (200.0, 100.0), (100.0, 50.0)]);
    let overlay = LayoutPage::from_first_page(&overlay_source()).unwrap();
    overlay_document(&mut doc, &overlay).unwrap();

    for page in page_ids(&doc) {
        let mut bytes = Vec::new();
        for id in contents_of(&doc, page) {
            bytes.extend(plain_bytes(doc.get_object(id).unwrap().as_stream().unwrap()).unwrap());
        }
        let ops = Content::decode(&bytes).unwrap().operations;
        let saves = ops.iter().filter(|op| op.operator == "q").count();
        let restores = ops.iter().filter(|op| op.operator == "Q").count();
        assert_eq!(saves, 3);
        assert_eq!(saves, restores);
        assert_eq!(ops.last().unwrap().operator, "Q");
    }
}

#[test]
fn shifts_follow_each_page_size() {
    let mut doc = target_doc(&[(200.0, 100.0), (100.0, 50.0), (201.0, 100.0)]);
    let overlay = LayoutPage::from_first_page(&overlay_source()).unwrap();
    overlay_document(&mut doc, &overlay).unwrap();

    let placements: Vec<String> = page_ids(&doc)
        .into_iter()
        .map(|p| stream_text(&doc, *contents_of(&doc, p).last().unwrap()))
        .collect();
    assert!(placements[0].contains("1 0 0 1 0.0 0.0 cm"));
    assert!(placements[1].contains("1 0 0 1 -50.0 -25.0 cm"));
    assert!(placements[2].contains("1 0 0 1 0.5 0.0 cm"));
}

#[test]
fn form_is_shared_and_carries_the_overlay() {
    let mut doc = target_doc(&[(612.0, 792.0), (612.0, 792.0)]);
    let overlay = LayoutPage::from_first_page(&overlay_source()).unwrap();
    overlay_document(&mut doc, &overlay).unwrap();

    let ids: Vec<ObjectId> = page_ids(&doc)
        .into_iter()
        .map(|p| x_objects(&doc, p).get(b"OL1").unwrap().as_reference().unwrap())
        .collect();
    assert_eq!(ids[0], ids[1]);

    let form = doc.get_object(ids[0]).unwrap().as_stream().unwrap();
    assert_eq!(form.dict.get(b"Subtype").unwrap().as_name().unwrap(), b"Form");
    assert_eq!(form.dict.get(b"FormType").unwrap().as_i64().unwrap(), 1);
    assert_eq!(form.content, overlay.content().content);
    assert_eq!(
        plain_bytes(form).unwrap(),
        b"0 0 m 200 100 l S\nBT /F1 8 Tf (stamp) Tj ET\n"
    );

    let bbox = Rect::from_object(&doc, form.dict.get(b"BBox").unwrap()).unwrap();
    assert_eq!(bbox, Rect::new(0.0, 0.0, 200.0, 100.0));
    let matrix = form.dict.get(b"Matrix").unwrap().as_array().unwrap();
    let matrix: Vec<i64> = matrix.iter().map(|o| o.as_i64().unwrap()).collect();
    assert_eq!(matrix, vec![1, 0, 0, 1, 0, 0]);
}

#[test]
fn overlay_resources_are_imported() {
    let mut doc = target_doc(&[(612.0, 792.0)]);
    let overlay = LayoutPage::from_first_page(&overlay_source()).unwrap();
    overlay_document(&mut doc, &overlay).unwrap();

    let page = page_ids(&doc)[0];
    let form_id = x_objects(&doc, page).get(b"OL1").unwrap().as_reference().unwrap();
    let form = doc.get_object(form_id).unwrap().as_stream().unwrap();
    let resources = form.dict.get(b"Resources").unwrap().as_dict().unwrap();
    let fonts = resources.get(b"Font").unwrap().as_dict().unwrap();
    let font_id = fonts.get(b"F1").unwrap().as_reference().unwrap();
    let font = doc.get_object(font_id).unwrap().as_dict().unwrap();
    assert_eq!(font.get(b"BaseFont").unwrap().as_name().unwrap(), b"Courier");

    // the page's own F1 is untouched
    let page_dict = doc.get_object(page).unwrap().as_dict().unwrap();
    let page_fonts = page_dict
        .get(b"Resources")
        .unwrap()
        .as_dict()
        .unwrap()
        .get(b"Font")
        .unwrap()
        .as_dict()
        .unwrap();
    let page_font = page_fonts.get(b"F1").unwrap().as_reference().unwrap();
    let page_font = doc.get_object(page_font).unwrap().as_dict().unwrap();
    assert_eq!(page_font.get(b"BaseFont").unwrap().as_name().unwrap(), b"Helvetica");
}

#[test]
fn existing_names_are_never_overwritten() {
    let mut doc = target_doc(&[(612.0, 792.0)]);
    let page = page_ids(&doc)[0];
    let logo = doc.add_object(content_stream("0 0 1 1 re f").unwrap());
    {
        let dict = doc.get_object_mut(page).unwrap().as_dict_mut().unwrap();
        let resources = dict.get_mut(b"Resources").unwrap().as_dict_mut().unwrap();
        resources.set("XObject", dictionary! { "OL1" => logo });
    }
    let overlay = LayoutPage::from_first_page(&overlay_source()).unwrap();
    overlay_document(&mut doc, &overlay).unwrap();

    let x = x_objects(&doc, page);
    assert_eq!(x.len(), 2);
    assert_eq!(x.get(b"OL1").unwrap().as_reference().unwrap(), logo);
    assert!(x.has(b"OL2"));
    let placement = stream_text(&doc, *contents_of(&doc, page).last().unwrap());
    assert!(placement.contains("/OL2 Do"));
}

#[test]
fn second_overlay_gets_a_new_name() {
    let mut doc = target_doc(&[(612.0, 792.0)]);
    let overlay = LayoutPage::from_first_page(&overlay_source()).unwrap();
    overlay_document(&mut doc, &overlay).unwrap();
    Compositor::with_prefix("OL").apply(&mut doc, &overlay).unwrap();

    let page = page_ids(&doc)[0];
    let x = x_objects(&doc, page);
    assert!(x.has(b"OL1") && x.has(b"OL2"));
    // q [q original Q placement1] Q placement2
    assert_eq!(contents_of(&doc, page).len(), 7);
}

#[test]
fn inherited_resources_are_copied_not_mutated() {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids = Vec::new();
    for _ in 0..2 {
        let contents = doc.add_object(content_stream("0 0 m 1 1 l S").unwrap());
        let page = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => contents,
        });
        kids.push(Object::Reference(page));
    }
    let shared = dictionary! {
        "MediaBox" => Rect::new(0.0, 0.0, 400.0, 300.0).to_object(),
        "Resources" => dictionary! { "ProcSet" => vec![Object::from("PDF")] },
    };
    let mut doc = finish_doc(doc, pages_id, kids, shared);
    let overlay = LayoutPage::from_first_page(&overlay_source()).unwrap();
    overlay_document(&mut doc, &overlay).unwrap();

    let parent = doc.get_object(pages_id).unwrap().as_dict().unwrap();
    let parent_resources = parent.get(b"Resources").unwrap().as_dict().unwrap();
    assert!(!parent_resources.has(b"XObject"));
    for page in page_ids(&doc) {
        assert!(x_objects(&doc, page).has(b"OL1"));
        let placement = stream_text(&doc, *contents_of(&doc, page).last().unwrap());
        assert!(placement.contains("1 0 0 1 100.0 100.0 cm"));
    }
}

#[test]
fn page_without_contents_gets_only_markers_and_overlay() {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let page = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => Rect::new(0.0, 0.0, 200.0, 100.0).to_object(),
    });
    let mut doc = finish_doc(doc, pages_id, vec![page.into()], Dictionary::new());
    let overlay = LayoutPage::from_first_page(&overlay_source()).unwrap();
    overlay_document(&mut doc, &overlay).unwrap();

    let contents = contents_of(&doc, page);
    assert_eq!(contents.len(), 3);
    assert_eq!(stream_text(&doc, contents[0]), "q\n");
    assert_eq!(stream_text(&doc, contents[1]), "Q\n");
}

#[test]
fn structural_error_leaves_document_untouched() {
    let mut doc = target_doc(&[(612.0, 792.0), (612.0, 792.0)]);
    let pages = page_ids(&doc);
    {
        let dict = doc.get_object_mut(pages[1]).unwrap().as_dict_mut().unwrap();
        dict.set("Contents", Object::Integer(42));
    }
    let objects_before = doc.objects.len();
    let max_before = doc.max_id;
    let first_before = contents_of_single(&doc, pages[0]);

    let overlay = LayoutPage::from_first_page(&overlay_source()).unwrap();
    let err = overlay_document(&mut doc, &overlay).unwrap_err();

    assert!(matches!(err, OverlayError::Structural(ref m) if m.contains("Integer")));
    assert!(!err.is_io_failure());
    assert_eq!(doc.objects.len(), objects_before);
    assert_eq!(doc.max_id, max_before);
    assert_eq!(contents_of_single(&doc, pages[0]), first_before);
}

#[test]
fn geometry_and_page_count_are_unchanged() {
    let mut doc = target_doc(&[(612.0, 792.0), (842.0, 595.0)]);
    let overlay = LayoutPage::from_first_page(&overlay_source()).unwrap();
    overlay_document(&mut doc, &overlay).unwrap();

    let pages = page_ids(&doc);
    assert_eq!(pages.len(), 2);
    assert_eq!(Rect::media_box_of(&doc, pages[1]).unwrap(), Rect::new(0.0, 0.0, 842.0, 595.0));
}

#[test]
fn overlay_is_reusable_across_documents() {
    let overlay = LayoutPage::from_first_page(&overlay_source()).unwrap();
    let before = overlay.content().content.clone();
    for _ in 0..2 {
        let mut doc = target_doc(&[(612.0, 792.0)]);
        overlay_document(&mut doc, &overlay).unwrap();
    }
    assert_eq!(overlay.content().content, before);
}

#[test]
fn template_round_trips_through_files() {
    let dir = tempfile::tempdir().unwrap();
    let target_path = dir.path().join("report.pdf");
    let overlay_path = dir.path().join("letterhead.pdf");
    let out_path = dir.path().join("report.stamped.pdf");
    target_doc(&[(612.0, 792.0), (612.0, 792.0)]).save(&target_path).unwrap();
    overlay_source().save(&overlay_path).unwrap();

    Template::open(&target_path)
        .unwrap()
        .overlay_file(&overlay_path)
        .unwrap()
        .save(&out_path)
        .unwrap();

    let stamped = Document::load(&out_path).unwrap();
    assert_eq!(stamped.get_pages().len(), 2);
    for page in page_ids(&stamped) {
        assert!(x_objects(&stamped, page).has(b"OL1"));
    }
}

#[test]
fn template_reports_missing_overlay() {
    let template = Template::from_document(target_doc(&[(612.0, 792.0)]));
    let err = template
        .overlay_file(std::path::Path::new("/nonexistent/letterhead.pdf"))
        .err()
        .unwrap();
    assert!(matches!(err, OverlayError::MissingResource(_)));
}

#[test]
fn template_to_bytes_loads_back() {
    let mut template = Template::from_document(target_doc(&[(612.0, 792.0)]))
        .overlay_document(&overlay_source())
        .unwrap();
    assert_eq!(template.page_count(), 1);
    let bytes = template.to_bytes().unwrap();
    assert_eq!(Document::load_mem(&bytes).unwrap().get_pages().len(), 1);
}
