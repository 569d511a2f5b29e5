//! Interactive comparison session.
//!
//! One [`ExplorationSession`] per user: it owns the georeferenced dataset,
//! the series cache, the gage catalog and the aligner with its null
//! placeholder. None of it is shared, so sessions can run side by side.
//!
//! The query methods return `Result` and never swallow errors. The `on_*`
//! callbacks are the UI boundary: they render what they can, log failures
//! and report whether anything was drawn.

use lis_common::{GeoPoint, LisError, Result, TimeSeries};
use lis_grid::{DatasetLocator, DatasetStore, GeoreferencedDataset, Location, SeriesExtractor};
use tracing::{debug, error, info, info_span, warn, Span};
use uuid::Uuid;

use crate::aligner::{AlignedPair, TemporalAligner};
use crate::catalog::GageCatalog;
use crate::config::ExplorerConfig;
use crate::render::{Renderer, VariableMap};

/// Title of the placeholder plot shown while no gage is selected.
pub const NO_GAGES_TITLE: &str = "No Gages";

pub struct ExplorationSession {
    id: Uuid,
    span: Span,
    extractor: SeriesExtractor,
    catalog: GageCatalog,
    aligner: TemporalAligner,
    variable: String,
    config: ExplorerConfig,
}

impl ExplorationSession {
    /// Start a session over a georeferenced dataset.
    ///
    /// The configured default variable is selected when the dataset offers
    /// it, otherwise the first available one.
    pub fn new(dataset: GeoreferencedDataset, catalog: GageCatalog, config: ExplorerConfig) -> Result<Self> {
        let id = Uuid::new_v4();
        let span = info_span!("session", session_id = %id);
        let _enter = span.enter();

        let extractor = SeriesExtractor::new(dataset)?.with_cache(config.series_cache_entries);
        let variables = extractor.list_available_variables();
        let variable = if variables.contains(&config.default_variable) {
            config.default_variable.clone()
        } else {
            variables
                .first()
                .cloned()
                .ok_or_else(|| LisError::UnknownVariable("dataset has no 3-D variables".to_string()))?
        };

        info!(
            variable = %variable,
            variables = variables.len(),
            gages = catalog.len(),
            "Session started"
        );
        drop(_enter);

        Ok(Self {
            id,
            span,
            extractor,
            catalog,
            aligner: TemporalAligner::new(),
            variable,
            config,
        })
    }

    /// Open and georeference a dataset from a store, then start a session.
    pub fn open(
        store: &dyn DatasetStore,
        locator: &DatasetLocator,
        catalog: GageCatalog,
        config: ExplorerConfig,
    ) -> Result<Self> {
        let raw = store.open_dataset(locator)?;
        Self::new(GeoreferencedDataset::new(raw)?, catalog, config)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    pub fn catalog(&self) -> &GageCatalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut GageCatalog {
        &mut self.catalog
    }

    pub fn aligner(&self) -> &TemporalAligner {
        &self.aligner
    }

    pub fn extractor(&self) -> &SeriesExtractor {
        &self.extractor
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    /// Variables offered for selection, in declaration order.
    pub fn variables(&self) -> Vec<String> {
        self.extractor.list_available_variables()
    }

    pub fn set_variable(&mut self, name: &str) -> Result<()> {
        if !self.variables().iter().any(|v| v == name) {
            return Err(LisError::UnknownVariable(name.to_string()));
        }
        let _enter = self.span.enter();
        debug!(from = %self.variable, to = name, "Variable changed");
        self.variable = name.to_string();
        Ok(())
    }

    /// Model series at a gage's cell aligned against its observations.
    pub fn compare_gage(&mut self, index: usize) -> Result<AlignedPair> {
        let span = self.span.clone();
        let _enter = span.enter();

        let record = self.catalog.select(index)?;
        let model = self.extractor.extract(&self.variable, record.location())?;
        let pair = self.aligner.align(&model, record.observations());
        debug!(
            gage = record.id(),
            variable = %self.variable,
            points = pair.len(),
            "Compared gage"
        );
        Ok(pair)
    }

    /// Model series at the grid node nearest to `point`.
    pub fn site_series(&mut self, point: GeoPoint) -> Result<TimeSeries> {
        let index = self.extractor.dataset().grid().nearest_index(&point)?;
        self.extractor.extract(&self.variable, Location::Index(index))
    }

    /// First time step of the current variable with the gage layer.
    pub fn variable_map(&self) -> Result<VariableMap> {
        let snapshot = self.extractor.snapshot(&self.variable, 0)?;
        Ok(VariableMap {
            value_range: snapshot.value_range(),
            snapshot,
            gages: self.catalog.points(),
            center: self.extractor.dataset().grid().center(),
        })
    }

    /// Gage selection callback.
    ///
    /// Only the first selected gage is compared. The plot is titled by gage
    /// id (`Gage[08158000]`), not by its position in the catalog, so the
    /// title stays stable when the header is reordered. An empty selection
    /// shows the null placeholder, which exists once some gage has been
    /// compared.
    pub fn on_gage_selection(&mut self, selection: &[usize], renderer: &mut dyn Renderer) -> bool {
        let span = self.span.clone();
        let _enter = span.enter();

        let result = match selection.first() {
            None => self.aligner.null_placeholder().and_then(|null| {
                renderer.render_pair(&null.as_pair(), NO_GAGES_TITLE, &self.config.graph_style)
            }),
            Some(&index) => self.compare_gage(index).and_then(|pair| {
                let title = pair.observed.title();
                renderer.render_pair(&pair, &title, &self.config.graph_style)
            }),
        };
        report("gage selection", result)
    }

    /// Map tap callback.
    pub fn on_point_tap(&mut self, point: GeoPoint, renderer: &mut dyn Renderer) -> bool {
        let span = self.span.clone();
        let _enter = span.enter();

        let result = self.site_series(point).and_then(|series| {
            renderer.render_series(&series, &self.variable, &self.config.graph_style)
        });
        report("point tap", result)
    }

    /// Variable picker callback: switch variable and redraw the map.
    pub fn on_variable_change(&mut self, name: &str, renderer: &mut dyn Renderer) -> bool {
        let span = self.span.clone();
        let _enter = span.enter();

        let result = self
            .set_variable(name)
            .and_then(|_| self.variable_map())
            .and_then(|map| renderer.render_map(&map, &self.config.map_style));
        report("variable change", result)
    }
}

/// Log a callback failure. Selection problems are expected during
/// interaction and logged at `warn`; anything else at `error`.
fn report(action: &str, result: Result<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) if e.is_selection_error() => {
            warn!(action, error = %e, "Nothing to show");
            false
        }
        Err(e) => {
            error!(action, error = %e, "Callback failed");
            false
        }
    }
}
