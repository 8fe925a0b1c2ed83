//! Example: Live collections over a mutating tree

use fos_livedom::{Document, LiveDomConfig};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = LiveDomConfig::builder()
        .fine_grained_child_invalidation(true)
        .build();
    let doc = Document::with_config(config);

    let html = doc.create_element("html");
    let body = doc.create_element("body");
    doc.append_child(&html)?;
    html.append_child(&body)?;

    let paragraphs = body.get_elements_by_tag_name("p");
    let images = doc.images();

    for i in 0..5 {
        let p = doc.create_element("p");
        p.set_attribute("id", &format!("p{i}"))?;
        p.append_child(&doc.create_text_node(&format!("Paragraph {i}")))?;
        body.append_child(&p)?;
    }
    let logo = doc.create_element("img");
    logo.set_attribute("name", "logo")?;
    body.append_child(&logo)?;

    println!("fOS Live DOM v{}", fos_livedom::VERSION);
    println!("{} paragraphs, {} images", paragraphs.length(), images.length());
    println!("third paragraph: {:?}", paragraphs.item(2).and_then(|p| p.id()));
    println!("images[\"logo\"]: {:?}", images.named_item("logo"));

    // Text edits leave element-only caches alone in fine-grained mode
    body.append_child(&doc.create_text_node("trailing"))?;
    println!("paragraph cache after text insert: {:?}", paragraphs.cache_state());

    if let Some(first) = paragraphs.item(0) {
        body.remove_child(&first)?;
    }
    println!("{} paragraphs after removal", paragraphs.length());
    Ok(())
}
