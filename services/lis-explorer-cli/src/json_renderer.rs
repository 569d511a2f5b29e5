//! Renderer that prints one JSON document per drawing request.

use std::io::Write;

use lis_common::{Result, TimeSeries};
use lis_explorer::{AlignedPair, GraphStyle, MapStyle, Renderer, VariableMap};
use serde::Serialize;

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Document<'a> {
    Series {
        title: &'a str,
        style: &'a GraphStyle,
        series: &'a TimeSeries,
    },
    Pair {
        title: &'a str,
        style: &'a GraphStyle,
        model: &'a TimeSeries,
        observed: &'a TimeSeries,
    },
    Map {
        style: &'a MapStyle,
        map: &'a VariableMap,
    },
}

/// Writes newline-delimited JSON to any writer.
pub struct JsonRenderer<W: Write> {
    out: W,
    pretty: bool,
}

impl<W: Write> JsonRenderer<W> {
    pub fn new(out: W, pretty: bool) -> Self {
        Self { out, pretty }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, doc: &Document<'_>) -> Result<()> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.out, doc)?;
        } else {
            serde_json::to_writer(&mut self.out, doc)?;
        }
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write> Renderer for JsonRenderer<W> {
    fn render_series(&mut self, series: &TimeSeries, title: &str, style: &GraphStyle) -> Result<()> {
        self.emit(&Document::Series { title, style, series })
    }

    fn render_pair(&mut self, pair: &AlignedPair, title: &str, style: &GraphStyle) -> Result<()> {
        self.emit(&Document::Pair {
            title,
            style,
            model: &pair.model,
            observed: &pair.observed,
        })
    }

    fn render_map(&mut self, map: &VariableMap, style: &MapStyle) -> Result<()> {
        self.emit(&Document::Map { style, map })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lis_explorer::align;
    use test_utils::{date, gage_series, model_series};

    #[test]
    fn test_pair_document() {
        let pair = align(
            &model_series("Streamflow_tavg", date(2020, 1, 1), 3, 1.0),
            &gage_series("08158000", date(2020, 1, 2), 3, 5.0),
        );
        let mut renderer = JsonRenderer::new(Vec::new(), false);
        renderer
            .render_pair(&pair, "Gage[08158000]", &GraphStyle::default())
            .unwrap();

        let text = String::from_utf8(renderer.into_inner()).unwrap();
        assert_eq!(text.lines().count(), 1);
        let doc: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(doc["kind"], "pair");
        assert_eq!(doc["title"], "Gage[08158000]");
        assert_eq!(doc["style"]["width"], 800);
        assert_eq!(doc["model"]["values"], serde_json::json!([2.0, 3.0]));
        assert_eq!(doc["observed"]["values"], serde_json::json!([5.0, 6.0]));
    }
}
