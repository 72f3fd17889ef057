//! Post-process effect chain
//!
//! Effects are parameter bags bound to a shader technique by name; a chain
//! is an ordered pipeline stage the renderer consumes opaquely. The engine
//! never evaluates the techniques.

use crate::foundation::math::{Vec3, Vec4};

/// A single effect parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum EffectParam {
    /// Scalar parameter (e.g. blur radius)
    Scalar(f32),
    /// 3-component parameter (e.g. tint)
    Vec3(Vec3),
    /// 4-component parameter (e.g. color with alpha)
    Vec4(Vec4),
}

/// A post-process effect: a technique name plus its parameters
///
/// Parameter order is preserved; backends bind them positionally or by
/// name as their shader model requires.
#[derive(Debug, Clone)]
pub struct PostEffect {
    /// Shader technique name, resolved by the content pipeline
    pub technique: String,
    params: Vec<(String, EffectParam)>,
}

impl PostEffect {
    /// Create an effect with no parameters
    pub fn new(technique: impl Into<String>) -> Self {
        Self {
            technique: technique.into(),
            params: Vec::new(),
        }
    }

    /// Set a parameter, replacing any existing value under the same name
    pub fn set_param(&mut self, name: impl Into<String>, value: EffectParam) {
        let name = name.into();
        if let Some(entry) = self.params.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = value;
        } else {
            self.params.push((name, value));
        }
    }

    /// Look up a parameter by name
    pub fn param(&self, name: &str) -> Option<&EffectParam> {
        self.params.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// All parameters in insertion order
    pub fn params(&self) -> &[(String, EffectParam)] {
        &self.params
    }
}

/// Ordered chain of post-process effects
#[derive(Debug, Clone, Default)]
pub struct PostChain {
    effects: Vec<PostEffect>,
}

impl PostChain {
    /// Create an empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an effect to the end of the chain
    pub fn push(&mut self, effect: PostEffect) {
        self.effects.push(effect);
    }

    /// Insert an effect at `index`, shifting later effects back
    ///
    /// Clamped to the end of the chain if `index` is past it.
    pub fn insert(&mut self, index: usize, effect: PostEffect) {
        let index = index.min(self.effects.len());
        self.effects.insert(index, effect);
    }

    /// Remove and return the effect at `index`, if present
    pub fn remove(&mut self, index: usize) -> Option<PostEffect> {
        if index < self.effects.len() {
            Some(self.effects.remove(index))
        } else {
            None
        }
    }

    /// Effects in application order
    pub fn effects(&self) -> &[PostEffect] {
        &self.effects
    }

    /// Number of effects in the chain
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Whether the chain is empty
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_param_replaces() {
        let mut blur = PostEffect::new("gaussian_blur");
        blur.set_param("radius", EffectParam::Scalar(2.0));
        blur.set_param("radius", EffectParam::Scalar(4.0));
        assert_eq!(blur.params().len(), 1);
        assert_eq!(blur.param("radius"), Some(&EffectParam::Scalar(4.0)));
    }

    #[test]
    fn test_chain_ordering() {
        let mut chain = PostChain::new();
        chain.push(PostEffect::new("blur"));
        chain.push(PostEffect::new("tonemap"));
        chain.insert(1, PostEffect::new("depth_of_field"));

        let names: Vec<&str> = chain.effects().iter().map(|e| e.technique.as_str()).collect();
        assert_eq!(names, vec!["blur", "depth_of_field", "tonemap"]);

        let removed = chain.remove(0).unwrap();
        assert_eq!(removed.technique, "blur");
        assert!(chain.remove(5).is_none());
        assert_eq!(chain.len(), 2);
    }
}
