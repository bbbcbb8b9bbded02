use crate::error::{EngineError, Result};

/// Plus grand univers représentable par un `SymbolSet`.
pub const MAX_UNIVERSE: u8 = 64;

/// Ensemble de numéros 1..=64 stocké sur un masque de bits (bit n-1 = numéro n).
/// Itération toujours en ordre croissant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolSet(u64);

impl SymbolSet {
    pub const fn empty() -> Self {
        SymbolSet(0)
    }

    fn bit(n: u8) -> u64 {
        debug_assert!((1..=MAX_UNIVERSE).contains(&n));
        1u64 << (n - 1)
    }

    pub fn contains(&self, n: u8) -> bool {
        (1..=MAX_UNIVERSE).contains(&n) && self.0 & Self::bit(n) != 0
    }

    /// Retourne `false` si le numéro était déjà présent.
    pub fn insert(&mut self, n: u8) -> bool {
        let present = self.contains(n);
        self.0 |= Self::bit(n);
        !present
    }

    pub fn remove(&mut self, n: u8) -> bool {
        let present = self.contains(n);
        self.0 &= !Self::bit(n);
        present
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn union(&self, other: &SymbolSet) -> SymbolSet {
        SymbolSet(self.0 | other.0)
    }

    pub fn difference(&self, other: &SymbolSet) -> SymbolSet {
        SymbolSet(self.0 & !other.0)
    }

    pub fn intersection(&self, other: &SymbolSet) -> SymbolSet {
        SymbolSet(self.0 & other.0)
    }

    pub fn intersection_count(&self, other: &SymbolSet) -> usize {
        (self.0 & other.0).count_ones() as usize
    }

    pub fn is_disjoint(&self, other: &SymbolSet) -> bool {
        self.0 & other.0 == 0
    }

    pub fn is_subset(&self, other: &SymbolSet) -> bool {
        self.0 & !other.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        let bits = self.0;
        (1..=MAX_UNIVERSE).filter(move |&n| bits & Self::bit(n) != 0)
    }

    pub fn sum(&self) -> u32 {
        self.iter().map(u32::from).sum()
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.iter().collect()
    }

    /// Construit un ensemble en vérifiant l'appartenance à l'univers et
    /// l'absence de doublons.
    pub fn from_numbers(numbers: &[u8], universe: &Universe) -> Result<SymbolSet> {
        let mut set = SymbolSet::empty();
        for &n in numbers {
            universe.check(n)?;
            if !set.insert(n) {
                return Err(EngineError::invalid(format!("numéro {} en double", n)));
            }
        }
        Ok(set)
    }
}

impl FromIterator<u8> for SymbolSet {
    /// Les numéros hors 1..=64 sont ignorés ; utiliser `from_numbers` pour
    /// une construction validée.
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        let mut set = SymbolSet::empty();
        for n in iter {
            if (1..=MAX_UNIVERSE).contains(&n) {
                set.insert(n);
            }
        }
        set
    }
}

/// Univers fermé [1, size] disposé ligne par ligne sur une grille de
/// largeur `grid_width` (le volant 5×5 pour la Lotofácil).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Universe {
    size: u8,
    grid_width: u8,
}

impl Universe {
    pub fn new(size: u8, grid_width: u8) -> Result<Self> {
        if size == 0 || size > MAX_UNIVERSE {
            return Err(EngineError::invalid(format!(
                "taille d'univers {} hors de 1-{}",
                size, MAX_UNIVERSE
            )));
        }
        if grid_width == 0 {
            return Err(EngineError::invalid("largeur de grille nulle"));
        }
        Ok(Self { size, grid_width })
    }

    pub fn lotofacil() -> Self {
        Self {
            size: lotofacil_db::models::UNIVERSE_SIZE,
            grid_width: lotofacil_db::models::GRID_WIDTH,
        }
    }

    pub fn size(&self) -> u8 {
        self.size
    }

    pub fn check(&self, n: u8) -> Result<()> {
        if n == 0 || n > self.size {
            return Err(EngineError::SymbolOutOfRange { symbol: n, universe: self.size });
        }
        Ok(())
    }

    pub fn all(&self) -> SymbolSet {
        (1..=self.size).collect()
    }

    pub fn primes(&self) -> SymbolSet {
        (2..=self.size)
            .filter(|&n| (2..n).take_while(|d| d * d <= n).all(|d| n % d != 0))
            .collect()
    }

    pub fn fibonacci(&self) -> SymbolSet {
        let mut set = SymbolSet::empty();
        let (mut a, mut b) = (1u32, 2u32);
        while a <= u32::from(self.size) {
            set.insert(a as u8);
            (a, b) = (b, a + b);
        }
        set
    }

    /// Lignes de la grille, de haut en bas (la dernière peut être incomplète).
    pub fn rows(&self) -> Vec<SymbolSet> {
        (1..=self.size)
            .step_by(self.grid_width as usize)
            .map(|start| {
                let end = start.saturating_add(self.grid_width - 1).min(self.size);
                (start..=end).collect()
            })
            .collect()
    }

    /// Bord de la grille : première et dernière ligne, première et dernière colonne.
    pub fn frame(&self) -> SymbolSet {
        let width = self.grid_width;
        let rows = self.size.div_ceil(width);
        (1..=self.size)
            .filter(|&n| {
                let row = (n - 1) / width;
                let col = (n - 1) % width;
                row == 0 || row == rows - 1 || col == 0 || col == width - 1
            })
            .collect()
    }
}
