#![allow(missing_docs)]

use std::{fmt::Display, str::FromStr};
#[cfg(feature = "graphviz")]
use std::path::{Path, PathBuf};

use itertools::Itertools;
use thiserror::Error;

use crate::{structure::EdgeGroup, Set, Structure};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("could not run the renderer: {0}")]
    Io(#[from] std::io::Error),
    #[error("Child process had non-zero exit status \"{0}\"")]
    NonZeroExit(std::process::ExitStatus),
}

/// The image formats that the `dot` binary is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    #[default]
    Png,
    Svg,
    Pdf,
}

impl ImageFormat {
    /// The file extension, which coincides with the name graphviz uses for the format.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Svg => "svg",
            ImageFormat::Pdf => "pdf",
        }
    }
}

impl FromStr for ImageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(ImageFormat::Png),
            "svg" => Ok(ImageFormat::Svg),
            "pdf" => Ok(ImageFormat::Pdf),
            other => Err(format!("unsupported image format `{other}`")),
        }
    }
}

/// Settings that determine how a [`Structure`] is drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub format: ImageFormat,
    /// Name or path of the graphviz `dot` binary.
    pub dot_binary: String,
    /// Color of highlighted states and edges.
    pub highlight_color: String,
    pub default_color: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            format: ImageFormat::Png,
            dot_binary: "dot".to_string(),
            highlight_color: "darkgreen".to_string(),
            default_color: "black".to_string(),
        }
    }
}

/// Quotes `name` so that it can be used as an identifier or attribute value in the DOT language.
fn quote(name: &str) -> String {
    format!("\"{}\"", name.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Preferred name of the invisible node from which the arrow to the initial state starts.
const START_NODE: &str = "initial arrow";

/// Returns a name for the invisible start node that differs from every name in `states`.
fn start_node<'a, I: IntoIterator<Item = &'a str>>(states: I) -> String {
    let taken: Set<&str> = states.into_iter().collect();
    let mut name = START_NODE.to_string();
    while taken.contains(name.as_str()) {
        name.push('_');
    }
    name
}

pub trait Dottable {
    /// Compute the graphviz representation, for more information on the DOT format,
    /// see the [graphviz documentation](https://graphviz.org/doc/info/lang.html).
    fn dot_representation(&self, options: &RenderOptions) -> String {
        let header = std::iter::once(format!("digraph {} {{", quote(&self.dot_name())))
            .chain(self.dot_header_statements(options));

        let states = self.dot_states().into_iter().map(|q| {
            format!(
                "{} [{}]",
                quote(q),
                self.dot_state_attributes(q, options)
                    .into_iter()
                    .map(|attr| attr.to_string())
                    .join(", ")
            )
        });

        let transitions = self.dot_edges().into_iter().map(|group| {
            format!(
                "{} -> {} [{}]",
                quote(&group.source),
                quote(&group.target),
                self.dot_transition_attributes(group, options)
                    .into_iter()
                    .map(|attr| attr.to_string())
                    .join(", ")
            )
        });

        let mut lines = header
            .chain(states)
            .chain(transitions)
            .chain(std::iter::once("}".to_string()));
        lines.join("\n")
    }

    fn dot_header_statements(&self, _options: &RenderOptions) -> Vec<String> {
        vec![]
    }

    fn dot_name(&self) -> String;

    fn dot_states(&self) -> Vec<&str>;

    fn dot_edges(&self) -> Vec<&EdgeGroup>;

    fn dot_state_attributes(&self, _state: &str, _options: &RenderOptions) -> Vec<DotStateAttribute> {
        vec![]
    }

    fn dot_transition_attributes(
        &self,
        _group: &EdgeGroup,
        _options: &RenderOptions,
    ) -> Vec<DotTransitionAttribute> {
        vec![]
    }

    /// Renders `self` through the `dot` binary and writes the result to `<stem>.<extension>`,
    /// returning the path of the written file. The DOT source is passed through a temporary file,
    /// which is removed again regardless of whether rendering succeeds.
    /// This method is only available on the `graphviz` crate feature.
    #[cfg(feature = "graphviz")]
    fn render_to_file(&self, stem: &Path, options: &RenderOptions) -> Result<PathBuf, RenderError> {
        use std::io::Write;
        use tracing::{debug, trace};

        let dot = self.dot_representation(options);
        trace!("writing dot representation\n{}", dot);

        let mut tempfile = tempfile::NamedTempFile::new()?;
        tempfile.write_all(dot.as_bytes())?;
        tempfile.flush()?;

        let mut target = stem.as_os_str().to_owned();
        target.push(".");
        target.push(options.format.extension());
        let target = PathBuf::from(target);

        debug!("rendering {} with {}", target.display(), options.dot_binary);
        let status = std::process::Command::new(&options.dot_binary)
            .arg(format!("-T{}", options.format.extension()))
            .arg("-o")
            .arg(&target)
            .arg(tempfile.path())
            .status()?;

        if !status.success() {
            return Err(RenderError::NonZeroExit(status));
        }
        Ok(target)
    }
}

impl Dottable for Structure {
    fn dot_name(&self) -> String {
        self.name.clone()
    }

    fn dot_header_statements(&self, options: &RenderOptions) -> Vec<String> {
        let (color, width) = emphasis(options, self.highlight.is_some());
        let start = quote(&start_node(self.states.iter().map(String::as_str)));
        vec![
            "rankdir=LR".to_string(),
            format!("{start} [label=\"\", shape=\"none\", width=0, height=0]"),
            format!(
                "{start} -> {} [{}, {}]",
                quote(&self.initial),
                DotTransitionAttribute::Color(color),
                DotTransitionAttribute::PenWidth(width)
            ),
        ]
    }

    fn dot_states(&self) -> Vec<&str> {
        self.states.iter().map(String::as_str).collect()
    }

    fn dot_edges(&self) -> Vec<&EdgeGroup> {
        self.edges.iter().collect()
    }

    fn dot_state_attributes(&self, state: &str, options: &RenderOptions) -> Vec<DotStateAttribute> {
        let shape = if self.is_final(state) {
            "doublecircle"
        } else {
            "circle"
        };
        let (color, width) = emphasis(options, self.is_highlighted_state(state));
        vec![
            DotStateAttribute::Shape(shape.into()),
            DotStateAttribute::Label(state.to_string()),
            DotStateAttribute::Color(color.clone()),
            DotStateAttribute::FontColor(color),
            DotStateAttribute::PenWidth(width),
        ]
    }

    fn dot_transition_attributes(
        &self,
        group: &EdgeGroup,
        options: &RenderOptions,
    ) -> Vec<DotTransitionAttribute> {
        let (color, width) = emphasis(options, self.is_highlighted_group(group));
        vec![
            DotTransitionAttribute::Label(group.label.clone()),
            DotTransitionAttribute::Color(color.clone()),
            DotTransitionAttribute::FontColor(color),
            DotTransitionAttribute::PenWidth(width),
        ]
    }
}

fn emphasis(options: &RenderOptions, highlighted: bool) -> (String, String) {
    if highlighted {
        (options.highlight_color.clone(), "2.0".to_string())
    } else {
        (options.default_color.clone(), "1.0".to_string())
    }
}

/// Enum that abstracts attributes in the DOT format.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum DotStateAttribute {
    /// The label of a node
    Label(String),
    /// The shape of a node
    Shape(String),
    /// The color of a node
    Color(String),
    FontColor(String),
    PenWidth(String),
}

impl Display for DotStateAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DotStateAttribute::Label(s) => write!(f, "label={}", quote(s)),
            DotStateAttribute::Shape(s) => write!(f, "shape={}", quote(s)),
            DotStateAttribute::Color(c) => write!(f, "color={}", quote(c)),
            DotStateAttribute::FontColor(c) => write!(f, "fontcolor={}", quote(c)),
            DotStateAttribute::PenWidth(w) => write!(f, "penwidth={w}"),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum DotTransitionAttribute {
    Label(String),
    Color(String),
    FontColor(String),
    PenWidth(String),
}

impl Display for DotTransitionAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DotTransitionAttribute::Label(lbl) => write!(f, "label={}", quote(lbl)),
            DotTransitionAttribute::Color(c) => write!(f, "color={}", quote(c)),
            DotTransitionAttribute::FontColor(c) => write!(f, "fontcolor={}", quote(c)),
            DotTransitionAttribute::PenWidth(w) => write!(f, "penwidth={w}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{quote, start_node, Dottable, ImageFormat, RenderOptions};
    use crate::{tests::ends_in_one, Definition};

    #[test]
    fn quoting() {
        assert_eq!(quote("q0"), "\"q0\"");
        assert_eq!(quote("a\"b"), "\"a\\\"b\"");
        assert_eq!(quote("a\\b"), "\"a\\\\b\"");
    }

    #[test_log::test]
    fn static_dot() {
        let dfa = ends_in_one();
        let dot = dfa
            .structure("ends_in_one", None)
            .dot_representation(&RenderOptions::default());

        assert!(dot.starts_with("digraph \"ends_in_one\" {\nrankdir=LR\n"));
        assert!(dot.contains(
            "\"q1\" [shape=\"doublecircle\", label=\"q1\", color=\"black\", fontcolor=\"black\", penwidth=1.0]"
        ));
        assert!(dot.contains("\"q0\" [shape=\"circle\""));
        assert!(dot.contains("\"initial arrow\" -> \"q0\" [color=\"black\", penwidth=1.0]"));
        assert!(dot.contains("\"q0\" -> \"q1\" [label=\"1\", color=\"black\""));
        assert!(!dot.contains("darkgreen"));
        assert!(dot.ends_with('}'));
    }

    #[test]
    fn highlighted_dot() {
        let dfa = ends_in_one();
        let trace = dfa.validate_string("1").unwrap();
        let dot = dfa
            .structure("ends_in_one", Some(&trace))
            .dot_representation(&RenderOptions::default());

        assert!(dot.contains("\"initial arrow\" -> \"q0\" [color=\"darkgreen\", penwidth=2.0]"));
        assert!(dot.contains(
            "\"q0\" -> \"q1\" [label=\"1\", color=\"darkgreen\", fontcolor=\"darkgreen\", penwidth=2.0]"
        ));
        assert!(dot.contains(
            "\"q1\" -> \"q0\" [label=\"0\", color=\"black\", fontcolor=\"black\", penwidth=1.0]"
        ));
    }

    #[test]
    fn start_node_avoids_state_names() {
        assert_eq!(start_node(["q0", "q1"]), "initial arrow");
        assert_eq!(
            start_node(["initial arrow", "initial arrow_", "q"]),
            "initial arrow__"
        );

        let dfa = Definition::default()
            .with_alphabet(['a'])
            .with_states(["initial arrow", "q"])
            .with_initial("q")
            .with_transitions([("initial arrow", 'a', "q"), ("q", 'a', "q")])
            .validate()
            .unwrap();
        let dot = dfa
            .structure("collision", None)
            .dot_representation(&RenderOptions::default());

        assert!(dot.contains("\"initial arrow_\" [label=\"\", shape=\"none\""));
        assert!(dot.contains("\"initial arrow_\" -> \"q\" [color=\"black\", penwidth=1.0]"));
        assert!(dot.contains("\"initial arrow\" [shape=\"circle\", label=\"initial arrow\""));
        assert!(dot.contains("\"initial arrow\" -> \"q\" [label=\"a\""));
        assert!(!dot.contains("\"initial arrow\" [label=\"\""));
    }

    #[test]
    fn image_format_from_str() {
        assert_eq!("SVG".parse::<ImageFormat>(), Ok(ImageFormat::Svg));
        assert_eq!(ImageFormat::default().extension(), "png");
        assert!("gif".parse::<ImageFormat>().is_err());
    }

    #[cfg(feature = "graphviz")]
    #[test]
    fn missing_renderer_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let options = RenderOptions {
            dot_binary: "this-binary-does-not-exist".to_string(),
            ..Default::default()
        };
        let result = ends_in_one()
            .structure("ends_in_one", None)
            .render_to_file(&dir.path().join("diagram"), &options);
        assert!(matches!(result, Err(super::RenderError::Io(_))));
    }

    #[cfg(feature = "graphviz")]
    #[test]
    #[ignore]
    fn render_dfa() {
        let dir = std::env::temp_dir();
        let dfa = ends_in_one();
        let trace = dfa.validate_string("101").unwrap();
        let path = dfa
            .structure("ends_in_one", Some(&trace))
            .render_to_file(&dir.join("ends_in_one"), &RenderOptions::default())
            .unwrap();
        assert!(path.exists());
    }
}
