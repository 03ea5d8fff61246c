//! 组件注册表接口与依赖图检查

use crate::definition::BeanDefinition;
use crate::resolver::{downcast_instance, Instance};
use async_trait::async_trait;
use infrastructure_common::DependencyError;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// 组件注册表
///
/// 按名称解析组件实例，单例在首次解析时创建并缓存，工厂组件每次解析都重新创建
#[async_trait]
pub trait BeanRegistry: Send + Sync {
    /// 按名称解析组件
    async fn resolve_by_name(&self, name: &str) -> Result<Instance, DependencyError>;

    /// 丢弃单例缓存，下次解析时重新创建
    ///
    /// 返回是否确实丢弃了一个实例
    async fn reset(&self, name: &str) -> Result<bool, DependencyError>;

    /// 获取组件定义
    fn definition(&self, name: &str) -> Option<&BeanDefinition>;

    /// 所有已注册的组件名称
    fn bean_names(&self) -> Vec<String>;

    /// 是否已注册
    fn contains(&self, name: &str) -> bool {
        self.definition(name).is_some()
    }
}

/// 按名称解析并转换为具体类型
pub async fn resolve_as<T, R>(registry: &R, name: &str) -> Result<Arc<T>, DependencyError>
where
    T: Send + Sync + 'static,
    R: BeanRegistry + ?Sized,
{
    let instance = registry.resolve_by_name(name).await?;
    downcast_instance(name, instance)
}

/// 依赖图节点
#[derive(Debug, Clone)]
pub struct DependencyGraphNode {
    /// 组件名称
    pub name: String,
    /// 引用的组件名称
    pub dependencies: Vec<String>,
}

/// 循环依赖检测器
pub trait CircularDependencyDetector: Send + Sync {
    /// 检测循环依赖，返回发现的每条环路
    fn detect_circular_dependencies(&self, graph: &[DependencyGraphNode]) -> Vec<String>;

    /// 构建依赖图
    fn build_dependency_graph<'a, I>(&self, definitions: I) -> Vec<DependencyGraphNode>
    where
        I: IntoIterator<Item = &'a BeanDefinition>,
        Self: Sized,
    {
        definitions
            .into_iter()
            .map(|definition| DependencyGraphNode {
                name: definition.name().to_string(),
                dependencies: definition.bean_dependencies().map(str::to_string).collect(),
            })
            .collect()
    }
}

/// 默认循环依赖检测器
#[derive(Debug, Default)]
pub struct DefaultCircularDependencyDetector;

impl CircularDependencyDetector for DefaultCircularDependencyDetector {
    fn detect_circular_dependencies(&self, graph: &[DependencyGraphNode]) -> Vec<String> {
        // 深度优先搜索，路径栈保留访问顺序用于输出环路
        let nodes: HashMap<&str, &DependencyGraphNode> =
            graph.iter().map(|node| (node.name.as_str(), node)).collect();
        let mut visited = HashSet::new();
        let mut path = Vec::new();
        let mut cycles = Vec::new();

        for node in graph {
            if !visited.contains(node.name.as_str()) {
                Self::dfs_check(&node.name, &nodes, &mut visited, &mut path, &mut cycles);
            }
        }

        cycles
    }
}

impl DefaultCircularDependencyDetector {
    fn dfs_check<'a>(
        current: &'a str,
        nodes: &HashMap<&'a str, &'a DependencyGraphNode>,
        visited: &mut HashSet<&'a str>,
        path: &mut Vec<&'a str>,
        cycles: &mut Vec<String>,
    ) {
        if let Some(start) = path.iter().position(|name| *name == current) {
            let mut chain: Vec<&str> = path[start..].to_vec();
            chain.push(current);
            cycles.push(chain.join(" -> "));
            return;
        }

        if visited.contains(current) {
            return;
        }

        path.push(current);

        if let Some(node) = nodes.get(current).copied() {
            for dep in &node.dependencies {
                Self::dfs_check(dep, nodes, visited, path, cycles);
            }
        }

        path.pop();
        visited.insert(current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use infrastructure_common::Lifecycle;

    fn definition(name: &str, deps: &[&str]) -> BeanDefinition {
        deps.iter().fold(
            BeanDefinition::new(name, Lifecycle::Singleton, |_| Ok(())),
            |definition, dep| definition.with_bean_ref(*dep, *dep),
        )
    }

    #[test]
    fn acyclic_graph_has_no_cycles() {
        let detector = DefaultCircularDependencyDetector;
        let definitions = [definition("a", &["b"]), definition("b", &["c"]), definition("c", &[])];
        let graph = detector.build_dependency_graph(definitions.iter());
        assert_eq!(graph.len(), 3);
        assert!(detector.detect_circular_dependencies(&graph).is_empty());
    }

    #[test]
    fn cycle_is_reported_in_visit_order() {
        let detector = DefaultCircularDependencyDetector;
        let definitions = [definition("a", &["b"]), definition("b", &["a"])];
        let graph = detector.build_dependency_graph(definitions.iter());
        assert_eq!(detector.detect_circular_dependencies(&graph), vec!["a -> b -> a"]);
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let detector = DefaultCircularDependencyDetector;
        let definitions = [definition("a", &["a"])];
        let graph = detector.build_dependency_graph(definitions.iter());
        assert_eq!(detector.detect_circular_dependencies(&graph), vec!["a -> a"]);
    }
}
