use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

/// 属性分类之间的分隔符，例如 `Extensions/extension_name`
pub const CATEGORY_SEPARATOR: char = '/';

/// 进程级的属性ID驻留表
static INTERNED: LazyLock<RwLock<HashSet<Arc<str>>>> = LazyLock::new(|| RwLock::new(HashSet::new()));

/// PropertyId 表示一个扁平化的属性标识符
///
/// 相同的 (category, name) 总是得到同一个驻留实例，因此可以作为映射键
/// 在多个线程之间自由克隆和比较。
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyId(Arc<str>);

impl PropertyId {
    /// 从完整的标识符字符串获取PropertyId
    ///
    /// 已驻留的ID返回共享实例；未知的ID得到一个独立的实例，不会写入驻留表，
    /// 因此调用方传入的任意字符串不会让驻留表增长。
    pub fn parse(id: &str) -> Self {
        match lookup(id) {
            Some(existing) => Self(existing),
            None => Self(Arc::from(id)),
        }
    }

    /// 获取驻留的PropertyId，必要时写入驻留表；只用于构造schema中的属性
    fn intern(id: &str) -> Self {
        if let Some(existing) = lookup(id) {
            return Self(existing);
        }

        let mut table = INTERNED.write().unwrap_or_else(PoisonError::into_inner);
        // 另一个线程可能在我们等待写锁期间已经插入
        if let Some(existing) = table.get(id) {
            return Self(Arc::clone(existing));
        }
        let interned: Arc<str> = Arc::from(id);
        table.insert(Arc::clone(&interned));
        Self(interned)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 属性所属的分类，顶层属性返回 None
    pub fn category(&self) -> Option<&str> {
        self.0.rsplit_once(CATEGORY_SEPARATOR).map(|(category, _)| category)
    }

    /// 去掉分类后的简单名称
    pub fn name(&self) -> &str {
        self.0
            .rsplit_once(CATEGORY_SEPARATOR)
            .map_or(self.as_str(), |(_, name)| name)
    }

    /// 判断该属性是否位于给定分类（或其子分类）之下
    pub fn is_within(&self, category: &PropertyId) -> bool {
        let id = self.as_str();
        let prefix = category.as_str();
        id.len() > prefix.len()
            && id.starts_with(prefix)
            && id[prefix.len()..].starts_with(CATEGORY_SEPARATOR)
    }

    /// 两个ID是否共享同一个驻留实例
    pub fn ptr_eq(&self, other: &PropertyId) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

fn lookup(id: &str) -> Option<Arc<str>> {
    INTERNED
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(id)
        .cloned()
}

/// 根据分类和名称构造并驻留属性ID
pub fn property_id(category: &str, name: &str) -> PropertyId {
    if category.is_empty() {
        PropertyId::intern(name)
    } else if name.is_empty() {
        PropertyId::intern(category)
    } else {
        PropertyId::intern(&format!("{category}{CATEGORY_SEPARATOR}{name}"))
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl From<&str> for PropertyId {
    fn from(id: &str) -> Self {
        Self::parse(id)
    }
}

impl AsRef<str> for PropertyId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for PropertyId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for PropertyId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_id_is_interned() {
        let a = property_id("Extensions", "extension_name");
        let b = property_id("Extensions", "extension_name");
        assert_eq!(a, b);
        assert!(a.ptr_eq(&b));
        assert_eq!(a.as_str(), "Extensions/extension_name");
    }

    #[test]
    fn test_property_id_parts() {
        let id = property_id("Extensions/links", "href");
        assert_eq!(id.category(), Some("Extensions/links"));
        assert_eq!(id.name(), "href");

        let top = property_id("", "href");
        assert_eq!(top.category(), None);
        assert_eq!(top.name(), "href");

        assert_eq!(property_id("Extensions", "").as_str(), "Extensions");
    }

    #[test]
    fn test_is_within_category() {
        let category = PropertyId::parse("Extensions");
        assert!(property_id("Extensions", "extension_name").is_within(&category));
        assert!(property_id("Extensions/links", "href").is_within(&category));
        assert!(!PropertyId::parse("ExtensionsX/name").is_within(&category));
        assert!(!category.is_within(&category));
    }

    #[test]
    fn test_property_id_serde() {
        let id = property_id("Extensions", "extension_name");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"Extensions/extension_name\"");

        let back: PropertyId = serde_json::from_str(&json).unwrap();
        assert!(back.ptr_eq(&id));
    }

    #[test]
    fn test_unknown_ids_are_not_interned() {
        for i in 0..100 {
            let raw = format!("\"Caller/unknown_{i}\"");
            let id: PropertyId = serde_json::from_str(&raw).unwrap();
            assert_eq!(id.as_str(), format!("Caller/unknown_{i}"));
            assert!(lookup(id.as_str()).is_none());
        }

        let parsed = PropertyId::parse("Caller/unknown_parsed");
        let converted = PropertyId::from("Caller/unknown_parsed");
        assert_eq!(parsed, converted);
        assert!(!parsed.ptr_eq(&converted));
        assert!(lookup("Caller/unknown_parsed").is_none());
    }

    #[test]
    fn test_parse_finds_interned_id() {
        let id = property_id("Lookup", "known");
        let parsed = PropertyId::parse("Lookup/known");
        assert!(parsed.ptr_eq(&id));
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_property_id_shared_across_threads() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| property_id("Threads", "shared")))
            .collect();
        let ids: Vec<PropertyId> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(ids.windows(2).all(|pair| pair[0].ptr_eq(&pair[1])));
    }
}
