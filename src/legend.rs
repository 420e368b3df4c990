//! Legend assembly from trained non-position scales.

use crate::aes::AestheticSpec;
use crate::error::Result;
use crate::geom::KeyValues;
use crate::ir::{Legend, LegendBlock, LegendKey};
use crate::layer::{Layer, ShowLegend};
use crate::scale::{ScaleKind, ScaleSet};
use indexmap::IndexMap;
use tracing::debug;

/// Whether `layer` draws keys for the scale of `aes`.
fn contributes(layer: &Layer, global: &AestheticSpec, aes: &str) -> bool {
    match layer.legend() {
        ShowLegend::True => true,
        ShowLegend::False => false,
        ShowLegend::Auto => {
            layer.maps_from_data(global, aes)
                && !layer.fixed_values().contains_key(aes)
                && layer.geom().supported_aes().contains(&aes)
        }
    }
}

/// Guide title of `aes`: explicit label, scale name, then the source text
/// of the first layer mapping it.
pub fn guide_title(aes: &str, labels: &IndexMap<String, String>, scales: &ScaleSet, layers: &[Layer], global: &AestheticSpec) -> String {
    if let Some(label) = labels.get(aes) {
        return label.clone();
    }
    if let Some(name) = scales.get(aes).and_then(|s| s.name.clone()) {
        return name;
    }
    layers
        .iter()
        .find_map(|l| l.effective_mapping(global).get(aes).map(|v| v.label()))
        .unwrap_or_else(|| aes.to_string())
}

/// Build legend blocks. Scales with equal titles and equal labels share a
/// block whose keys carry the visual values of every merged aesthetic.
pub fn assemble_legend(
    layers: &[Layer],
    global: &AestheticSpec,
    scales: &ScaleSet,
    labels: &IndexMap<String, String>,
) -> Result<Legend> {
    let mut blocks: Vec<LegendBlock> = Vec::new();
    for scale in scales.iter() {
        if scale.is_position() || !scale.guide || matches!(scale.kind(), ScaleKind::Identity) {
            continue;
        }
        let aes = scale.aesthetic();
        let contributing: Vec<usize> = layers
            .iter()
            .enumerate()
            .filter(|(_, l)| contributes(l, global, aes))
            .map(|(i, _)| i)
            .collect();
        if contributing.is_empty() {
            continue;
        }

        let mut keys: Vec<LegendKey> = Vec::new();
        for b in scale.breaks()? {
            if keys.iter().any(|k| k.label == b.label) {
                continue;
            }
            let mut values = KeyValues::new();
            values.insert(aes.to_string(), b.mapped);
            keys.push(LegendKey { label: b.label, values });
        }
        if keys.is_empty() {
            continue;
        }
        let title = guide_title(aes, labels, scales, layers, global);

        let same = |block: &LegendBlock| {
            block.title == title
                && block.keys.len() == keys.len()
                && block.keys.iter().zip(&keys).all(|(a, b)| a.label == b.label)
        };
        match blocks.iter_mut().find(|b| same(b)) {
            Some(block) => {
                block.aesthetics.push(aes.to_string());
                for (existing, new) in block.keys.iter_mut().zip(keys) {
                    existing.values.extend(new.values);
                }
                for layer in contributing {
                    if !block.layers.contains(&layer) {
                        block.layers.push(layer);
                    }
                }
                block.layers.sort_unstable();
            }
            None => blocks.push(LegendBlock {
                title,
                aesthetics: vec![aes.to_string()],
                keys,
                layers: contributing,
            }),
        }
    }
    debug!(blocks = blocks.len(), "legend assembled");
    Ok(Legend { blocks })
}

/// Values a layer draws one key with: geom defaults, then the key's visual
/// values, then the layer's fixed values.
pub fn layer_key(layer: &Layer, key: &LegendKey) -> KeyValues {
    let mut values: KeyValues = layer
        .geom()
        .default_aes()
        .into_iter()
        .map(|(aes, v)| (aes.to_string(), v))
        .collect();
    for (aes, v) in &key.values {
        values.insert(aes.clone(), v.clone());
    }
    for (aes, v) in layer.fixed_values() {
        values.insert(aes.clone(), v.clone());
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Column, Value};
    use crate::scale::Scale;

    fn trained(scale: Scale, col: Column) -> Scale {
        let mut scale = scale;
        scale.train(&col).unwrap();
        scale.finish_training();
        scale
    }

    fn levels() -> Column {
        Column::Text(vec!["a".into(), "b".into()])
    }

    #[test]
    fn test_merges_scales_with_same_title_and_labels() {
        let global = AestheticSpec::new()
            .map("x", "x")
            .unwrap()
            .map("color", "g")
            .unwrap()
            .map("shape", "g")
            .unwrap();
        let layers = vec![Layer::new("point").unwrap()];
        let scales = ScaleSet::from_declared(&[
            trained(Scale::discrete("color"), levels()),
            trained(Scale::discrete("shape"), levels()),
        ])
        .unwrap();
        let legend = assemble_legend(&layers, &global, &scales, &IndexMap::new()).unwrap();
        assert_eq!(legend.blocks.len(), 1);
        let block = &legend.blocks[0];
        assert_eq!(block.title, "g");
        assert_eq!(block.aesthetics, vec!["color", "shape"]);
        assert_eq!(block.keys[0].values["shape"], Value::Str("circle".into()));
        assert_eq!(block.keys[1].values["color"], Value::Str("#FF7F0E".into()));
    }

    #[test]
    fn test_different_titles_stay_apart() {
        let global = AestheticSpec::new().map("color", "g").unwrap().map("shape", "g").unwrap();
        let layers = vec![Layer::new("point").unwrap()];
        let scales = ScaleSet::from_declared(&[
            trained(Scale::discrete("color"), levels()),
            trained(Scale::discrete("shape").with_name("Kind"), levels()),
        ])
        .unwrap();
        let legend = assemble_legend(&layers, &global, &scales, &IndexMap::new()).unwrap();
        assert_eq!(legend.blocks.len(), 2);
    }

    #[test]
    fn test_constant_mapping_and_hidden_layers() {
        let global = AestheticSpec::new().constant("color", Value::Str("a".into()));
        let scales = ScaleSet::from_declared(&[trained(Scale::discrete("color"), levels())]).unwrap();
        let auto = vec![Layer::new("point").unwrap()];
        assert!(assemble_legend(&auto, &global, &scales, &IndexMap::new()).unwrap().is_empty());

        let forced = vec![Layer::new("point").unwrap().show_legend(ShowLegend::True)];
        let legend = assemble_legend(&forced, &global, &scales, &IndexMap::new()).unwrap();
        assert_eq!(legend.blocks[0].layers, vec![0]);

        let mapped = AestheticSpec::new().map("color", "g").unwrap();
        let hidden = vec![Layer::new("point").unwrap().show_legend(ShowLegend::False)];
        assert!(assemble_legend(&hidden, &mapped, &scales, &IndexMap::new()).unwrap().is_empty());
    }

    #[test]
    fn test_layer_key_precedence() {
        let layer = Layer::new("point").unwrap().fixed("size", Value::Num(4.0));
        let key = LegendKey {
            label: "a".into(),
            values: [("color".to_string(), Value::Str("red".into()))].into_iter().collect(),
        };
        let values = layer_key(&layer, &key);
        assert_eq!(values["color"], Value::Str("red".into()));
        assert_eq!(values["size"], Value::Num(4.0));
        assert_eq!(values["shape"], Value::Str("circle".into()));
    }
}
