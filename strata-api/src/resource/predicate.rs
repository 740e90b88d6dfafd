use crate::resource::{PropertyId, PropertyMap, Resource};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Predicate 表示针对属性ID的布尔过滤表达式
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Predicate {
    /// 匹配所有
    AlwaysTrue,

    /// AND条件
    And { predicates: Vec<Predicate> },

    /// OR条件
    Or { predicates: Vec<Predicate> },

    /// NOT条件
    Not { predicate: Box<Predicate> },

    /// 等于条件
    Equals { property_id: PropertyId, value: Value },

    /// 不等于条件
    NotEquals { property_id: PropertyId, value: Value },

    /// 小于条件
    LessThan { property_id: PropertyId, value: Value },

    /// 小于等于条件
    LessThanOrEqual { property_id: PropertyId, value: Value },

    /// 大于条件
    GreaterThan { property_id: PropertyId, value: Value },

    /// 大于等于条件
    GreaterThanOrEqual { property_id: PropertyId, value: Value },

    /// IN条件
    In { property_id: PropertyId, values: Vec<Value> },
}

impl Predicate {
    /// AND组合，相邻的AND会被展平
    pub fn and(self, other: Predicate) -> Self {
        match (self, other) {
            (Predicate::And { mut predicates }, Predicate::And { predicates: rest }) => {
                predicates.extend(rest);
                Predicate::And { predicates }
            }
            (Predicate::And { mut predicates }, other) => {
                predicates.push(other);
                Predicate::And { predicates }
            }
            (first, second) => Predicate::And {
                predicates: vec![first, second],
            },
        }
    }

    /// OR组合，相邻的OR会被展平
    pub fn or(self, other: Predicate) -> Self {
        match (self, other) {
            (Predicate::Or { mut predicates }, Predicate::Or { predicates: rest }) => {
                predicates.extend(rest);
                Predicate::Or { predicates }
            }
            (Predicate::Or { mut predicates }, other) => {
                predicates.push(other);
                Predicate::Or { predicates }
            }
            (first, second) => Predicate::Or {
                predicates: vec![first, second],
            },
        }
    }

    /// NOT取反
    pub fn not(self) -> Self {
        Predicate::Not {
            predicate: Box::new(self),
        }
    }

    /// 谓词中引用的所有属性ID
    pub fn property_ids(&self) -> BTreeSet<PropertyId> {
        let mut ids = BTreeSet::new();
        self.collect_property_ids(&mut ids);
        ids
    }

    fn collect_property_ids(&self, ids: &mut BTreeSet<PropertyId>) {
        match self {
            Predicate::AlwaysTrue => {}
            Predicate::And { predicates } | Predicate::Or { predicates } => {
                for predicate in predicates {
                    predicate.collect_property_ids(ids);
                }
            }
            Predicate::Not { predicate } => predicate.collect_property_ids(ids),
            Predicate::Equals { property_id, .. }
            | Predicate::NotEquals { property_id, .. }
            | Predicate::LessThan { property_id, .. }
            | Predicate::LessThanOrEqual { property_id, .. }
            | Predicate::GreaterThan { property_id, .. }
            | Predicate::GreaterThanOrEqual { property_id, .. }
            | Predicate::In { property_id, .. } => {
                ids.insert(property_id.clone());
            }
        }
    }

    /// 判断资源是否满足谓词
    ///
    /// 比较运算在资源缺少该属性时为假；`NotEquals` 是 `Equals` 的取反，
    /// 因此缺少属性时为真。
    pub fn evaluate(&self, resource: &Resource) -> bool {
        match self {
            Predicate::AlwaysTrue => true,
            Predicate::And { predicates } => predicates.iter().all(|p| p.evaluate(resource)),
            Predicate::Or { predicates } => predicates.iter().any(|p| p.evaluate(resource)),
            Predicate::Not { predicate } => !predicate.evaluate(resource),
            Predicate::Equals { property_id, value } => {
                compare(resource, property_id, value) == Some(Ordering::Equal)
            }
            Predicate::NotEquals { property_id, value } => {
                compare(resource, property_id, value) != Some(Ordering::Equal)
            }
            Predicate::LessThan { property_id, value } => {
                compare(resource, property_id, value) == Some(Ordering::Less)
            }
            Predicate::LessThanOrEqual { property_id, value } => matches!(
                compare(resource, property_id, value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Predicate::GreaterThan { property_id, value } => {
                compare(resource, property_id, value) == Some(Ordering::Greater)
            }
            Predicate::GreaterThanOrEqual { property_id, value } => matches!(
                compare(resource, property_id, value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Predicate::In { property_id, values } => values
                .iter()
                .any(|value| compare(resource, property_id, value) == Some(Ordering::Equal)),
        }
    }

    /// 将谓词展开为一组具体的属性映射
    ///
    /// 谓词被改写为析取范式，每个合取分支产生一个映射，其中只包含该分支上
    /// `Equals`（以及展开后的 `In`）的值。范围、`NotEquals` 和取反的比较只用于
    /// 事后过滤，不出现在映射中。同一分支对同一属性的多个等值以最后一个为准。
    /// 结果中不包含完全相同的映射。
    pub fn to_property_maps(&self) -> Vec<PropertyMap> {
        let mut maps = Vec::new();
        for map in self.branches() {
            if !maps.contains(&map) {
                maps.push(map);
            }
        }
        maps
    }

    fn branches(&self) -> Vec<PropertyMap> {
        match self {
            Predicate::Equals { property_id, value } => {
                vec![PropertyMap::from([(property_id.clone(), value.clone())])]
            }
            Predicate::In { property_id, values } => values
                .iter()
                .map(|value| PropertyMap::from([(property_id.clone(), value.clone())]))
                .collect(),
            Predicate::Or { predicates } => predicates.iter().flat_map(Predicate::branches).collect(),
            Predicate::And { predicates } => {
                predicates.iter().fold(vec![PropertyMap::new()], |acc, predicate| {
                    let right = predicate.branches();
                    acc.iter()
                        .flat_map(|left| {
                            right.iter().map(move |branch| {
                                let mut merged = left.clone();
                                merged.extend(branch.iter().map(|(k, v)| (k.clone(), v.clone())));
                                merged
                            })
                        })
                        .collect()
                })
            }
            Predicate::AlwaysTrue
            | Predicate::Not { .. }
            | Predicate::NotEquals { .. }
            | Predicate::LessThan { .. }
            | Predicate::LessThanOrEqual { .. }
            | Predicate::GreaterThan { .. }
            | Predicate::GreaterThanOrEqual { .. } => vec![PropertyMap::new()],
        }
    }
}

fn compare(resource: &Resource, property_id: &PropertyId, value: &Value) -> Option<Ordering> {
    resource
        .property(property_id)
        .and_then(|actual| compare_values(actual, value))
}

/// 比较两个属性值：能解析为数字的按数值比较，否则按字符串比较
pub fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    if left.is_null() || right.is_null() {
        return None;
    }
    if let (Some(l), Some(r)) = (as_number(left), as_number(right)) {
        // 全序比较：NaN 与 NaN 相等，比较总有结果
        return Some(l.total_cmp(&r));
    }
    Some(as_text(left).cmp(&as_text(right)))
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Predicates 提供谓词构建工具函数
pub mod predicates {
    use super::Predicate;
    use crate::resource::PropertyId;
    use serde_json::Value;

    pub fn equals(property_id: PropertyId, value: impl Into<Value>) -> Predicate {
        Predicate::Equals {
            property_id,
            value: value.into(),
        }
    }

    pub fn not_equals(property_id: PropertyId, value: impl Into<Value>) -> Predicate {
        Predicate::NotEquals {
            property_id,
            value: value.into(),
        }
    }

    pub fn less_than(property_id: PropertyId, value: impl Into<Value>) -> Predicate {
        Predicate::LessThan {
            property_id,
            value: value.into(),
        }
    }

    pub fn less_than_or_equal(property_id: PropertyId, value: impl Into<Value>) -> Predicate {
        Predicate::LessThanOrEqual {
            property_id,
            value: value.into(),
        }
    }

    pub fn greater_than(property_id: PropertyId, value: impl Into<Value>) -> Predicate {
        Predicate::GreaterThan {
            property_id,
            value: value.into(),
        }
    }

    pub fn greater_than_or_equal(property_id: PropertyId, value: impl Into<Value>) -> Predicate {
        Predicate::GreaterThanOrEqual {
            property_id,
            value: value.into(),
        }
    }

    /// 创建IN条件，只有一个值时退化为等于条件
    pub fn in_values(property_id: PropertyId, values: Vec<Value>) -> Predicate {
        if values.len() == 1 {
            let mut values = values;
            Predicate::Equals {
                property_id,
                value: values.remove(0),
            }
        } else {
            Predicate::In { property_id, values }
        }
    }
}
