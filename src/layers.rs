//! Splitting a G-code file into slicer layers
//!
//! Layers begin at `;LAYER:` marker lines. Text ahead of the first marker
//! forms its own leading layer. Concatenating the layers gives back the file.

/// Comment that opens a new layer in Cura output
pub const LAYER_MARKER: &str = ";LAYER:";

/// Split `text` in front of every layer marker line
pub fn split_layers(text: &str) -> Vec<&str> {
    let mut layers = Vec::new();
    let mut start = 0;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        if line.trim_start().starts_with(LAYER_MARKER) && offset > start {
            layers.push(&text[start..offset]);
            start = offset;
        }
        offset += line.len();
    }

    if start < text.len() {
        layers.push(&text[start..]);
    }
    layers
}

pub fn join_layers<S: AsRef<str>>(layers: &[S]) -> String {
    layers.iter().map(AsRef::as_ref).collect()
}
