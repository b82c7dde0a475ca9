use crate::Result;
use crate::graph::DirectedGraph;
use core::fmt::Write;
use std::borrow::Cow;

const GEXF_NAMESPACE: &str = "http://www.gexf.net/1.2draft";

/// Render a graph as a GEXF 1.2 document.
///
/// Node ids are the natural identifiers; edge ids are positions in the sorted edge list.
pub fn generate<W: Write>(graph: &DirectedGraph, writer: &mut W) -> Result<()> {
    writeln!(writer, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(writer, r#"<gexf xmlns="{GEXF_NAMESPACE}" version="1.2">"#)?;
    writeln!(writer, "  <meta>")?;
    writeln!(writer, "    <creator>gh-orgnet</creator>")?;
    writeln!(writer, "  </meta>")?;
    writeln!(writer, r#"  <graph mode="static" defaultedgetype="directed">"#)?;
    writeln!(writer, r#"    <attributes class="node">"#)?;
    writeln!(writer, r#"      <attribute id="0" title="kind" type="string"/>"#)?;
    writeln!(writer, r#"      <attribute id="1" title="organization" type="string"/>"#)?;
    writeln!(writer, "    </attributes>")?;

    writeln!(writer, "    <nodes>")?;
    for (id, attrs) in graph.nodes() {
        let id = xml_escape(id);
        writeln!(writer, r#"      <node id="{id}" label="{id}">"#)?;
        writeln!(writer, "        <attvalues>")?;
        writeln!(writer, r#"          <attvalue for="0" value="{}"/>"#, attrs.kind)?;
        writeln!(
            writer,
            r#"          <attvalue for="1" value="{}"/>"#,
            xml_escape(&attrs.organization_label())
        )?;
        writeln!(writer, "        </attvalues>")?;
        writeln!(writer, "      </node>")?;
    }
    writeln!(writer, "    </nodes>")?;

    writeln!(writer, "    <edges>")?;
    for (index, (source, target, weight)) in graph.edges().enumerate() {
        writeln!(
            writer,
            r#"      <edge id="{index}" source="{}" target="{}" weight="{weight}"/>"#,
            xml_escape(source),
            xml_escape(target)
        )?;
    }
    writeln!(writer, "    </edges>")?;

    writeln!(writer, "  </graph>")?;
    writeln!(writer, "</gexf>")?;
    Ok(())
}

/// Escape a value for use in an XML attribute.
fn xml_escape(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(s);
    }

    let mut escaped = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}
