use tracing::trace;

/// Hands out branch labels `label<N>` and entry labels `function<N>`.
/// Both counters only grow, so every label of one compilation is unique.
#[derive(Debug, Default)]
pub struct LabelGenerator {
    labels: usize,
    functions: usize,
}

impl LabelGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh_label(&mut self) -> String {
        let label = format!("label{}", self.labels);
        self.labels += 1;
        trace!(%label, "fresh label");
        label
    }

    pub fn fresh_function(&mut self) -> String {
        let label = format!("function{}", self.functions);
        self.functions += 1;
        trace!(%label, "fresh function label");
        label
    }
}
