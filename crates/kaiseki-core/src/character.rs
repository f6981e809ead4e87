// Character categories and unknown-word span generation.
//
// Every code point maps to an ordered list of categories. Each category
// carries the flags that drive unknown-word generation:
//   invoke  generate unknown spans even where a dictionary word matched
//   group   merge a run of same-category characters into one span
//   length  additionally emit prefixes of 2..=length characters

use hashbrown::HashMap;

use crate::buffer::{ensure_len, read_u32};

pub const DEFAULT_CATEGORY: &str = "DEFAULT";

/// Index into the category table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CategoryId(pub u8);

impl CategoryId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryDefinition {
    pub name: String,
    pub invoke: bool,
    pub group: bool,
    pub length: u8,
}

#[derive(Debug, thiserror::Error)]
pub enum CharacterError {
    #[error("unknown character category: {0}")]
    UnknownCategory(String),
    #[error("malformed character definitions: {0}")]
    Malformed(String),
}

impl From<crate::BufferError> for CharacterError {
    fn from(e: crate::BufferError) -> Self {
        CharacterError::Malformed(e.to_string())
    }
}

/// A candidate unknown word starting at some position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownSpan {
    pub category: CategoryId,
    /// Length in characters.
    pub length: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CharRange {
    start: u32,
    end: u32,
    categories: Vec<CategoryId>,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Collects category and range declarations in `char.def` order.
///
/// A range declared later wins over any earlier range it overlaps.
#[derive(Debug, Clone)]
pub struct CharacterDefinitionsBuilder {
    categories: Vec<CategoryDefinition>,
    ranges: Vec<CharRange>,
}

impl Default for CharacterDefinitionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CharacterDefinitionsBuilder {
    /// Start with just the DEFAULT category (no invoke, group, no length).
    pub fn new() -> Self {
        Self {
            categories: vec![CategoryDefinition {
                name: DEFAULT_CATEGORY.to_string(),
                invoke: false,
                group: true,
                length: 0,
            }],
            ranges: Vec::new(),
        }
    }

    /// Declare a category, or redefine the flags of an existing one.
    pub fn category(
        &mut self,
        name: &str,
        invoke: bool,
        group: bool,
        length: u8,
    ) -> Result<&mut Self, CharacterError> {
        if name.is_empty() || name.len() > u8::MAX as usize {
            return Err(CharacterError::Malformed(format!(
                "category name must be 1 to 255 bytes: {name:?}"
            )));
        }
        let def = CategoryDefinition {
            name: name.to_string(),
            invoke,
            group,
            length,
        };
        match self.categories.iter().position(|c| c.name == name) {
            Some(i) => self.categories[i] = def,
            None => {
                if self.categories.len() > u8::MAX as usize {
                    return Err(CharacterError::Malformed("too many categories".to_string()));
                }
                self.categories.push(def);
            }
        }
        Ok(self)
    }

    /// Map `start..=end` to `names`, the first name being the primary category.
    pub fn range(
        &mut self,
        start: char,
        end: char,
        names: &[&str],
    ) -> Result<&mut Self, CharacterError> {
        if start > end {
            return Err(CharacterError::Malformed(format!(
                "range U+{:04X}..U+{:04X} is reversed",
                start as u32, end as u32
            )));
        }
        let categories = resolve(&self.categories, names)?;
        self.ranges.push(CharRange {
            start: start as u32,
            end: end as u32,
            categories,
        });
        Ok(self)
    }

    pub fn build(&self) -> CharacterDefinitions {
        CharacterDefinitions {
            categories: self.categories.clone(),
            ranges: flatten(&self.ranges),
            overrides: HashMap::new(),
            fallback: vec![CategoryId(0)],
        }
    }

    /// IPADIC-style table covering the scripts found in Japanese text.
    pub fn japanese() -> Self {
        let mut b = Self::new();
        if let Err(e) = b.japanese_categories().and_then(|b| b.japanese_ranges()) {
            unreachable!("japanese preset: {e}");
        }
        b
    }

    fn japanese_categories(&mut self) -> Result<&mut Self, CharacterError> {
        self.category("DEFAULT", false, true, 0)?
            .category("SPACE", false, true, 0)?
            .category("KANJI", false, false, 2)?
            .category("SYMBOL", true, true, 0)?
            .category("NUMERIC", true, true, 0)?
            .category("ALPHA", true, true, 0)?
            .category("HIRAGANA", false, true, 2)?
            .category("KATAKANA", true, true, 2)?
            .category("KANJINUMERIC", true, true, 0)?
            .category("GREEK", true, true, 0)?
            .category("CYRILLIC", true, true, 0)
    }

    fn japanese_ranges(&mut self) -> Result<&mut Self, CharacterError> {
        self.range('\u{0020}', '\u{0020}', &["SPACE"])?
            .range('\u{0009}', '\u{0009}', &["SPACE"])?
            .range('\u{000A}', '\u{000A}', &["SPACE"])?
            .range('\u{000D}', '\u{000D}', &["SPACE"])?
            .range('\u{3000}', '\u{3000}', &["SPACE"])?
            .range('\u{0021}', '\u{002F}', &["SYMBOL"])?
            .range('\u{0030}', '\u{0039}', &["NUMERIC"])?
            .range('\u{003A}', '\u{0040}', &["SYMBOL"])?
            .range('\u{0041}', '\u{005A}', &["ALPHA"])?
            .range('\u{005B}', '\u{0060}', &["SYMBOL"])?
            .range('\u{0061}', '\u{007A}', &["ALPHA"])?
            .range('\u{007B}', '\u{007E}', &["SYMBOL"])?
            .range('\u{00A1}', '\u{00BF}', &["SYMBOL"])?
            .range('\u{00C0}', '\u{00FF}', &["ALPHA"])?
            .range('\u{0100}', '\u{017F}', &["ALPHA"])?
            .range('\u{0180}', '\u{0236}', &["ALPHA"])?
            .range('\u{0391}', '\u{03C9}', &["GREEK"])?
            .range('\u{0400}', '\u{04FF}', &["CYRILLIC"])?
            .range('\u{2000}', '\u{206F}', &["SYMBOL"])?
            .range('\u{2070}', '\u{209F}', &["NUMERIC"])?
            .range('\u{2150}', '\u{218F}', &["NUMERIC"])?
            .range('\u{2190}', '\u{21FF}', &["SYMBOL"])?
            .range('\u{2200}', '\u{22FF}', &["SYMBOL"])?
            .range('\u{2460}', '\u{24FF}', &["SYMBOL"])?
            .range('\u{2500}', '\u{257F}', &["SYMBOL"])?
            .range('\u{25A0}', '\u{25FF}', &["SYMBOL"])?
            .range('\u{2600}', '\u{26FF}', &["SYMBOL"])?
            .range('\u{3001}', '\u{303F}', &["SYMBOL"])?
            .range('\u{3005}', '\u{3005}', &["KANJI"])?
            .range('\u{3007}', '\u{3007}', &["KANJI", "KANJINUMERIC"])?
            .range('\u{3041}', '\u{309F}', &["HIRAGANA"])?
            .range('\u{30A1}', '\u{30FF}', &["KATAKANA"])?
            .range('\u{30FC}', '\u{30FC}', &["KATAKANA", "HIRAGANA"])?
            .range('\u{31F0}', '\u{31FF}', &["KATAKANA"])?
            .range('\u{3400}', '\u{4DBF}', &["KANJI"])?
            .range('\u{4E00}', '\u{9FFF}', &["KANJI"])?
            .range('\u{F900}', '\u{FAFF}', &["KANJI"])?
            .range('\u{20000}', '\u{2FFFF}', &["KANJI"])?
            .range('\u{4E00}', '\u{4E00}', &["KANJI", "KANJINUMERIC"])?
            .range('\u{4E8C}', '\u{4E8C}', &["KANJI", "KANJINUMERIC"])?
            .range('\u{4E09}', '\u{4E09}', &["KANJI", "KANJINUMERIC"])?
            .range('\u{56DB}', '\u{56DB}', &["KANJI", "KANJINUMERIC"])?
            .range('\u{4E94}', '\u{4E94}', &["KANJI", "KANJINUMERIC"])?
            .range('\u{516D}', '\u{516D}', &["KANJI", "KANJINUMERIC"])?
            .range('\u{4E03}', '\u{4E03}', &["KANJI", "KANJINUMERIC"])?
            .range('\u{516B}', '\u{516B}', &["KANJI", "KANJINUMERIC"])?
            .range('\u{4E5D}', '\u{4E5D}', &["KANJI", "KANJINUMERIC"])?
            .range('\u{5341}', '\u{5341}', &["KANJI", "KANJINUMERIC"])?
            .range('\u{767E}', '\u{767E}', &["KANJI", "KANJINUMERIC"])?
            .range('\u{5343}', '\u{5343}', &["KANJI", "KANJINUMERIC"])?
            .range('\u{4E07}', '\u{4E07}', &["KANJI", "KANJINUMERIC"])?
            .range('\u{5104}', '\u{5104}', &["KANJI", "KANJINUMERIC"])?
            .range('\u{5146}', '\u{5146}', &["KANJI", "KANJINUMERIC"])?
            .range('\u{FF10}', '\u{FF19}', &["NUMERIC"])?
            .range('\u{FF21}', '\u{FF3A}', &["ALPHA"])?
            .range('\u{FF41}', '\u{FF5A}', &["ALPHA"])?
            .range('\u{FF01}', '\u{FF0F}', &["SYMBOL"])?
            .range('\u{FF1A}', '\u{FF1F}', &["SYMBOL"])?
            .range('\u{FF3B}', '\u{FF40}', &["SYMBOL"])?
            .range('\u{FF5B}', '\u{FF65}', &["SYMBOL"])?
            .range('\u{FFE0}', '\u{FFEF}', &["SYMBOL"])?
            .range('\u{FF66}', '\u{FF9D}', &["KATAKANA"])?
            .range('\u{FF9E}', '\u{FF9F}', &["KATAKANA"])
    }
}

fn resolve(
    categories: &[CategoryDefinition],
    names: &[&str],
) -> Result<Vec<CategoryId>, CharacterError> {
    if names.is_empty() {
        return Err(CharacterError::Malformed("empty category list".to_string()));
    }
    let mut ids = Vec::with_capacity(names.len());
    for name in names {
        let id = categories
            .iter()
            .position(|c| c.name == *name)
            .ok_or_else(|| CharacterError::UnknownCategory(name.to_string()))?;
        let id = CategoryId(id as u8);
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

/// Resolve overlapping declarations into sorted, disjoint ranges.
fn flatten(declared: &[CharRange]) -> Vec<CharRange> {
    let mut bounds: Vec<u32> = declared
        .iter()
        .flat_map(|r| [r.start, r.end + 1])
        .collect();
    bounds.sort_unstable();
    bounds.dedup();

    let mut flat: Vec<CharRange> = Vec::new();
    for pair in bounds.windows(2) {
        let (lo, hi) = (pair[0], pair[1] - 1);
        let Some(owner) = declared.iter().rev().find(|r| r.start <= lo && hi <= r.end) else {
            continue;
        };
        match flat.last_mut() {
            Some(prev) if prev.end + 1 == lo && prev.categories == owner.categories => {
                prev.end = hi;
            }
            _ => flat.push(CharRange {
                start: lo,
                end: hi,
                categories: owner.categories.clone(),
            }),
        }
    }
    flat
}

// ---------------------------------------------------------------------------
// Compiled table
// ---------------------------------------------------------------------------

/// Code point classification used by unknown-word generation.
#[derive(Debug, Clone)]
pub struct CharacterDefinitions {
    categories: Vec<CategoryDefinition>,
    ranges: Vec<CharRange>,
    overrides: HashMap<char, Vec<CategoryId>>,
    fallback: Vec<CategoryId>,
}

impl CharacterDefinitions {
    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    pub fn categories(&self) -> &[CategoryDefinition] {
        &self.categories
    }

    pub fn definition(&self, id: CategoryId) -> Option<&CategoryDefinition> {
        self.categories.get(id.index())
    }

    pub fn category_id(&self, name: &str) -> Option<CategoryId> {
        self.categories
            .iter()
            .position(|c| c.name == name)
            .map(|i| CategoryId(i as u8))
    }

    pub fn category_name(&self, id: CategoryId) -> Option<&str> {
        self.definition(id).map(|d| d.name.as_str())
    }

    /// Categories of `c`, primary first. Unlisted characters are DEFAULT.
    pub fn lookup_categories(&self, c: char) -> &[CategoryId] {
        if let Some(ids) = self.overrides.get(&c) {
            return ids;
        }
        let cp = c as u32;
        let i = self.ranges.partition_point(|r| r.end < cp);
        match self.ranges.get(i) {
            Some(r) if r.start <= cp => &r.categories,
            _ => &self.fallback,
        }
    }

    /// Replace the categories of a single character.
    pub fn set_categories(&mut self, c: char, names: &[&str]) -> Result<(), CharacterError> {
        let ids = resolve(&self.categories, names)?;
        self.overrides.insert(c, ids);
        Ok(())
    }

    fn has_category(&self, c: char, id: CategoryId) -> bool {
        self.lookup_categories(c).contains(&id)
    }

    /// Unknown-word candidates starting at `position`.
    ///
    /// `found` says whether a known or user word starts there; categories
    /// without `invoke` only contribute when nothing was found. Spans come
    /// out per category as: the grouped run, the 2..=length prefixes, then
    /// the single character, with duplicates dropped.
    pub fn unknown_spans(&self, text: &[char], position: usize, found: bool) -> Vec<UnknownSpan> {
        let Some(&first) = text.get(position) else {
            return Vec::new();
        };
        let mut spans: Vec<UnknownSpan> = Vec::new();
        let push = |spans: &mut Vec<UnknownSpan>, span: UnknownSpan| {
            if !spans.contains(&span) {
                spans.push(span);
            }
        };

        for &category in self.lookup_categories(first) {
            let Some(def) = self.definition(category) else {
                continue;
            };
            if !def.invoke && found {
                continue;
            }

            let run = text[position..]
                .iter()
                .take_while(|&&c| self.has_category(c, category))
                .count();

            if def.group && run > 1 {
                push(&mut spans, UnknownSpan { category, length: run });
            }
            for length in 2..=(def.length as usize).min(run) {
                push(&mut spans, UnknownSpan { category, length });
            }
            push(&mut spans, UnknownSpan { category, length: 1 });
        }
        spans
    }

    // -----------------------------------------------------------------------
    // Serialization
    //
    //   [category count u32] per category:
    //       [invoke u8][group u8][length u8][name len u8][name utf-8]
    //   [range count u32] per range:
    //       [start u32][end u32][id count u8][ids u8...]
    //   [override count u32] per override:
    //       [code point u32][id count u8][ids u8...]
    // -----------------------------------------------------------------------

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&(self.categories.len() as u32).to_le_bytes());
        for def in &self.categories {
            // names are at most 255 bytes, checked when the category is defined
            let name = def.name.as_bytes();
            buf.extend_from_slice(&[def.invoke as u8, def.group as u8, def.length, name.len() as u8]);
            buf.extend_from_slice(name);
        }

        buf.extend_from_slice(&(self.ranges.len() as u32).to_le_bytes());
        for r in &self.ranges {
            buf.extend_from_slice(&r.start.to_le_bytes());
            buf.extend_from_slice(&r.end.to_le_bytes());
            write_ids(&mut buf, &r.categories);
        }

        let mut overrides: Vec<_> = self.overrides.iter().collect();
        overrides.sort_by_key(|(c, _)| **c);
        buf.extend_from_slice(&(overrides.len() as u32).to_le_bytes());
        for (c, ids) in overrides {
            buf.extend_from_slice(&(*c as u32).to_le_bytes());
            write_ids(&mut buf, ids);
        }
        buf
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, CharacterError> {
        let mut reader = Reader { data, pos: 0 };

        let category_count = reader.u32()? as usize;
        if category_count == 0 || category_count > u8::MAX as usize + 1 {
            return Err(CharacterError::Malformed(format!(
                "category count {category_count} out of range"
            )));
        }
        let mut categories = Vec::with_capacity(category_count);
        for _ in 0..category_count {
            let invoke = reader.u8()? != 0;
            let group = reader.u8()? != 0;
            let length = reader.u8()?;
            let name_len = reader.u8()? as usize;
            let name = std::str::from_utf8(reader.bytes(name_len)?)
                .map_err(|e| CharacterError::Malformed(format!("category name: {e}")))?
                .to_string();
            categories.push(CategoryDefinition {
                name,
                invoke,
                group,
                length,
            });
        }
        let fallback = categories
            .iter()
            .position(|c| c.name == DEFAULT_CATEGORY)
            .map(|i| vec![CategoryId(i as u8)])
            .ok_or_else(|| CharacterError::Malformed("no DEFAULT category".to_string()))?;

        let range_count = reader.u32()? as usize;
        let mut ranges: Vec<CharRange> = Vec::new();
        for _ in 0..range_count {
            let start = reader.u32()?;
            let end = reader.u32()?;
            if start > end || ranges.last().is_some_and(|prev| prev.end >= start) {
                return Err(CharacterError::Malformed(format!(
                    "range {start:#X}..={end:#X} is reversed or overlaps its predecessor"
                )));
            }
            let categories = reader.ids(category_count)?;
            ranges.push(CharRange {
                start,
                end,
                categories,
            });
        }

        let override_count = reader.u32()? as usize;
        let mut overrides = HashMap::with_capacity(override_count);
        for _ in 0..override_count {
            let cp = reader.u32()?;
            let c = char::from_u32(cp)
                .ok_or_else(|| CharacterError::Malformed(format!("invalid code point {cp:#X}")))?;
            overrides.insert(c, reader.ids(category_count)?);
        }

        if reader.pos != data.len() {
            return Err(CharacterError::Malformed(format!(
                "{} trailing bytes",
                data.len() - reader.pos
            )));
        }

        Ok(Self {
            categories,
            ranges,
            overrides,
            fallback,
        })
    }
}

fn write_ids(buf: &mut Vec<u8>, ids: &[CategoryId]) {
    buf.push(ids.len() as u8);
    buf.extend(ids.iter().map(|id| id.0));
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn bytes(&mut self, n: usize) -> Result<&'a [u8], CharacterError> {
        ensure_len(self.data, self.pos + n)?;
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, CharacterError> {
        Ok(self.bytes(1)?[0])
    }

    fn u32(&mut self) -> Result<u32, CharacterError> {
        ensure_len(self.data, self.pos + 4)?;
        let v = read_u32(self.data, self.pos);
        self.pos += 4;
        Ok(v)
    }

    fn ids(&mut self, category_count: usize) -> Result<Vec<CategoryId>, CharacterError> {
        let count = self.u8()? as usize;
        if count == 0 {
            return Err(CharacterError::Malformed("empty category list".to_string()));
        }
        let ids: Vec<CategoryId> = self.bytes(count)?.iter().map(|&b| CategoryId(b)).collect();
        if let Some(bad) = ids.iter().find(|id| id.index() >= category_count) {
            return Err(CharacterError::Malformed(format!(
                "category id {} out of range",
                bad.0
            )));
        }
        Ok(ids)
    }
}
