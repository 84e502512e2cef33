//! Fixed mapping from raw subcellular locality strings to coarse groups.

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LocalityGroup {
    Nucleus,
    Cytoplasm,
    MembraneExtracellular,
    Organelle,
    Other,
}

const ONTOLOGY: &[(&str, LocalityGroup)] = &[
    ("nucleus", LocalityGroup::Nucleus),
    ("nucleoplasm", LocalityGroup::Nucleus),
    ("nucleoli", LocalityGroup::Nucleus),
    ("nucleolus", LocalityGroup::Nucleus),
    ("nucleoli fibrillar center", LocalityGroup::Nucleus),
    ("nucleoli rim", LocalityGroup::Nucleus),
    ("nuclear speckles", LocalityGroup::Nucleus),
    ("nuclear bodies", LocalityGroup::Nucleus),
    ("nuclear membrane", LocalityGroup::Nucleus),
    ("nuclear envelope", LocalityGroup::Nucleus),
    ("chromatin", LocalityGroup::Nucleus),
    ("kinetochore", LocalityGroup::Nucleus),
    ("mitotic chromosome", LocalityGroup::Nucleus),
    ("cytoplasm", LocalityGroup::Cytoplasm),
    ("cytosol", LocalityGroup::Cytoplasm),
    ("cytoskeleton", LocalityGroup::Cytoplasm),
    ("microtubules", LocalityGroup::Cytoplasm),
    ("actin filaments", LocalityGroup::Cytoplasm),
    ("intermediate filaments", LocalityGroup::Cytoplasm),
    ("centrosome", LocalityGroup::Cytoplasm),
    ("centriolar satellite", LocalityGroup::Cytoplasm),
    ("cytoplasmic bodies", LocalityGroup::Cytoplasm),
    ("cytokinetic bridge", LocalityGroup::Cytoplasm),
    ("midbody", LocalityGroup::Cytoplasm),
    ("plasma membrane", LocalityGroup::MembraneExtracellular),
    ("cell membrane", LocalityGroup::MembraneExtracellular),
    ("membrane", LocalityGroup::MembraneExtracellular),
    ("cell junctions", LocalityGroup::MembraneExtracellular),
    ("focal adhesion sites", LocalityGroup::MembraneExtracellular),
    ("extracellular", LocalityGroup::MembraneExtracellular),
    ("extracellular region", LocalityGroup::MembraneExtracellular),
    ("extracellular space", LocalityGroup::MembraneExtracellular),
    ("secreted", LocalityGroup::MembraneExtracellular),
    ("mitochondria", LocalityGroup::Organelle),
    ("mitochondrion", LocalityGroup::Organelle),
    ("endoplasmic reticulum", LocalityGroup::Organelle),
    ("golgi apparatus", LocalityGroup::Organelle),
    ("vesicles", LocalityGroup::Organelle),
    ("endosomes", LocalityGroup::Organelle),
    ("lysosomes", LocalityGroup::Organelle),
    ("peroxisomes", LocalityGroup::Organelle),
    ("lipid droplets", LocalityGroup::Organelle),
];

impl LocalityGroup {
    pub const ALL: [Self; 5] = [
        Self::Nucleus,
        Self::Cytoplasm,
        Self::MembraneExtracellular,
        Self::Organelle,
        Self::Other,
    ];

    pub fn classify(raw: &str) -> Self {
        let key = raw.trim().to_lowercase();
        ONTOLOGY
            .iter()
            .find(|(name, _)| *name == key)
            .map_or(Self::Other, |(_, group)| *group)
    }

    /// Region inside the unit square as `(x, y, width, height)`.
    pub fn region(self) -> (f32, f32, f32, f32) {
        match self {
            Self::Nucleus => (0.0, 0.0, 0.5, 0.4),
            Self::Cytoplasm => (0.5, 0.0, 0.5, 0.4),
            Self::MembraneExtracellular => (0.0, 0.4, 0.5, 0.4),
            Self::Organelle => (0.5, 0.4, 0.5, 0.4),
            Self::Other => (0.0, 0.8, 1.0, 0.2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_is_case_insensitive_with_other_fallback() {
        assert_eq!(LocalityGroup::classify("Nucleoplasm"), LocalityGroup::Nucleus);
        assert_eq!(LocalityGroup::classify(" Plasma membrane "), LocalityGroup::MembraneExtracellular);
        assert_eq!(LocalityGroup::classify("Golgi apparatus"), LocalityGroup::Organelle);
        assert_eq!(LocalityGroup::classify("unknown"), LocalityGroup::Other);
    }

    #[test]
    fn regions_tile_the_unit_square() {
        let area = LocalityGroup::ALL
            .iter()
            .map(|group| {
                let (_, _, w, h) = group.region();
                w * h
            })
            .sum::<f32>();
        assert!((area - 1.0).abs() < 1e-6);
    }
}
