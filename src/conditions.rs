// conditions.rs
//
// Fixed experimental design: five timepoints of light stimulation for
// LightR-Src HeLa cells and the same five timepoints for parental HeLa.

/// Number of biological replicates measured per condition.
pub const REPLICATES_PER_CONDITION: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Group {
    Treatment,
    Control,
}

impl Group {
    pub fn legend_label(self) -> &'static str {
        match self {
            Group::Treatment => "LightR-Src HeLa",
            Group::Control => "HeLa",
        }
    }

    /// RGB triple used for the group's trajectory arrows.
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            Group::Treatment => (255, 0, 0),
            Group::Control => (0, 0, 255),
        }
    }
}

/// Where a condition's text label goes on the score plot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LabelPosition {
    /// Fixed position in PC1/PC2 data coordinates.
    Anchored { x: f64, y: f64 },
    /// Drawn at the point itself, separated by a leading space.
    BesidePoint,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConditionSpec {
    pub name: String,
    pub group: Group,
    /// Chronological index within the group.
    pub order: usize,
    pub label: String,
    pub label_position: LabelPosition,
}

impl ConditionSpec {
    pub fn new(name: &str, group: Group, order: usize, label_position: LabelPosition) -> Self {
        let label = name.strip_suffix(" ctrl").unwrap_or(name).to_string();
        Self {
            name: name.to_string(),
            group,
            order,
            label,
            label_position,
        }
    }

    /// Spreadsheet columns holding the replicate abundances, e.g.
    /// `Sum of 30 s`, `Sum of 30 s2`, `Sum of 30 s3`.
    pub fn replicate_columns(&self) -> [String; REPLICATES_PER_CONDITION] {
        [
            format!("Sum of {}", self.name),
            format!("Sum of {}2", self.name),
            format!("Sum of {}3", self.name),
        ]
    }

    pub fn text_for_plot(&self) -> String {
        match self.label_position {
            LabelPosition::Anchored { .. } => self.label.clone(),
            LabelPosition::BesidePoint => format!(" {}", self.label),
        }
    }
}

/// Ordered set of conditions; the order is the column order of the averaged matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct ConditionSet {
    conditions: Vec<ConditionSpec>,
}

impl ConditionSet {
    pub fn new(conditions: Vec<ConditionSpec>) -> Self {
        Self { conditions }
    }

    /// The published LightR-Src design with its hand-tuned label layout.
    pub fn lightr_src() -> Self {
        use Group::{Control, Treatment};
        use LabelPosition::{Anchored, BesidePoint};
        Self::new(vec![
            ConditionSpec::new("10 s", Treatment, 0, Anchored { x: -5.0, y: -3.0 }),
            ConditionSpec::new("30 s", Treatment, 1, Anchored { x: -1.0, y: -4.0 }),
            ConditionSpec::new("1 min", Treatment, 2, Anchored { x: 2.7, y: -2.9 }),
            ConditionSpec::new("5 min", Treatment, 3, Anchored { x: 15.5, y: 1.2 }),
            ConditionSpec::new("60 min", Treatment, 4, Anchored { x: 26.0, y: 0.5 }),
            ConditionSpec::new("10 s ctrl", Control, 0, Anchored { x: -14.0, y: 0.6 }),
            ConditionSpec::new("30 s ctrl", Control, 1, BesidePoint),
            ConditionSpec::new("1 min ctrl", Control, 2, BesidePoint),
            ConditionSpec::new("5 min ctrl", Control, 3, BesidePoint),
            ConditionSpec::new("60 min ctrl", Control, 4, BesidePoint),
        ])
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConditionSpec> {
        self.conditions.iter()
    }

    pub fn get(&self, index: usize) -> Option<&ConditionSpec> {
        self.conditions.get(index)
    }

    pub fn names(&self) -> Vec<&str> {
        self.conditions.iter().map(|c| c.name.as_str()).collect()
    }

    /// Groups in order of first appearance.
    pub fn groups(&self) -> Vec<Group> {
        let mut seen = Vec::new();
        for c in &self.conditions {
            if !seen.contains(&c.group) {
                seen.push(c.group);
            }
        }
        seen
    }

    /// Index pairs `(from, to)` of chronologically consecutive conditions
    /// within each group, grouped in first-appearance order.
    pub fn trajectory_steps(&self) -> Vec<(usize, usize)> {
        let mut steps = Vec::new();
        for group in self.groups() {
            let mut members: Vec<(usize, &ConditionSpec)> = self
                .conditions
                .iter()
                .enumerate()
                .filter(|(_, c)| c.group == group)
                .collect();
            members.sort_by_key(|(_, c)| c.order);
            for pair in members.windows(2) {
                steps.push((pair[0].0, pair[1].0));
            }
        }
        steps
    }
}

impl Default for ConditionSet {
    fn default() -> Self {
        Self::lightr_src()
    }
}
