use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SearchError};

/// 区域树节点（JSON 形状与 regions.json 一致）
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: u64,
    pub name: String,
    #[serde(default, rename = "subRegions")]
    pub sub_regions: Vec<Region>,
}

impl Region {
    pub fn leaf(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            sub_regions: Vec::new(),
        }
    }

    pub fn inner(id: u64, name: impl Into<String>, sub_regions: Vec<Region>) -> Self {
        Self {
            id,
            name: name.into(),
            sub_regions,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.sub_regions.is_empty()
    }
}

/// 区域层级：加载时一次 DFS 派生两张映射，之后只读。
///
/// - `leaves`: region id → 该子树下的叶子 id（DFS 顺序）
/// - `ancestors`: region id → 从根到自身的祖先链（含自身）
///
/// 两张表都是树的派生缓存，永远从树重新推导，不手工维护。
#[derive(Debug)]
pub struct RegionHierarchy {
    root_id: u64,
    leaves: HashMap<u64, Vec<u64>>,
    ancestors: HashMap<u64, Vec<u64>>,
    names: HashMap<u64, String>,
    preorder: Vec<u64>,
}

impl RegionHierarchy {
    pub fn new(root: &Region) -> Result<Self> {
        let mut h = Self {
            root_id: root.id,
            leaves: HashMap::new(),
            ancestors: HashMap::new(),
            names: HashMap::new(),
            preorder: Vec::new(),
        };
        let mut path = Vec::new();
        h.visit(root, &mut path)?;

        tracing::debug!(
            "Region hierarchy built: {} regions, {} leaves",
            h.preorder.len(),
            h.leaves.get(&h.root_id).map(Vec::len).unwrap_or(0)
        );
        Ok(h)
    }

    fn visit(&mut self, region: &Region, path: &mut Vec<u64>) -> Result<Vec<u64>> {
        if self.names.contains_key(&region.id) {
            return Err(SearchError::invalid(format!(
                "duplicate region id {} in region tree",
                region.id
            )));
        }
        self.names.insert(region.id, region.name.clone());
        self.preorder.push(region.id);

        path.push(region.id);
        self.ancestors.insert(region.id, path.clone());

        let covered = if region.is_leaf() {
            vec![region.id]
        } else {
            let mut acc = Vec::new();
            for sub in &region.sub_regions {
                acc.extend(self.visit(sub, path)?);
            }
            acc
        };
        path.pop();

        self.leaves.insert(region.id, covered.clone());
        Ok(covered)
    }

    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let root: Region = serde_json::from_str(json).context("failed to parse region tree")?;
        Ok(Self::new(&root)?)
    }

    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read region file {:?}", path))?;
        Self::from_json_str(&text)
    }

    pub fn root_id(&self) -> u64 {
        self.root_id
    }

    /// 子树覆盖的叶子集合；叶子自身返回 [id]
    pub fn leaves_under(&self, region_id: u64) -> Result<&[u64]> {
        self.leaves
            .get(&region_id)
            .map(Vec::as_slice)
            .ok_or_else(|| SearchError::region_not_found(region_id))
    }

    /// 祖先链（根在前，含自身）
    pub fn ancestors_of(&self, region_id: u64) -> Result<&[u64]> {
        self.ancestors
            .get(&region_id)
            .map(Vec::as_slice)
            .ok_or_else(|| SearchError::region_not_found(region_id))
    }

    pub fn contains(&self, region_id: u64) -> bool {
        self.names.contains_key(&region_id)
    }

    pub fn is_leaf(&self, region_id: u64) -> bool {
        matches!(self.leaves.get(&region_id), Some(v) if v.len() == 1 && v[0] == region_id)
    }

    pub fn name_of(&self, region_id: u64) -> Option<&str> {
        self.names.get(&region_id).map(String::as_str)
    }

    /// 所有 region id（先序）
    pub fn region_ids(&self) -> &[u64] {
        &self.preorder
    }

    pub fn len(&self) -> usize {
        self.preorder.len()
    }

    pub fn is_empty(&self) -> bool {
        self.preorder.is_empty()
    }
}
