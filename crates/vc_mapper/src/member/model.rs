use std::sync::Arc;

use log::trace;
use vc_schema::info::{TypeId, TypeKind};
use vc_schema::registry::TypeRegistry;

use crate::cache::SnapshotMap;
use crate::member::QualifiedMember;

/// Members of a type, shared between plans.
pub type Members = Arc<[Arc<QualifiedMember>]>;

/// Source paths are followed through at most this many members.
pub const MAX_PATH_DEPTH: usize = 3;

// -----------------------------------------------------------------------------
// MemberModel

/// Enumerates and caches the members of registered types.
///
/// Member shapes never change once a type is registered, so each type is
/// enumerated once per mapper. Both caches are append-only snapshot maps.
pub struct MemberModel {
    registry: Arc<TypeRegistry>,
    members: SnapshotMap<TypeId, Members>,
    paths: SnapshotMap<TypeId, Members>,
}

impl MemberModel {
    pub(crate) fn new(registry: Arc<TypeRegistry>) -> Self {
        Self {
            registry,
            members: SnapshotMap::default(),
            paths: SnapshotMap::default(),
        }
    }

    /// The members of `ty` in declaration order, base members first.
    ///
    /// Types other than structs have no members.
    pub fn members_of(&self, ty: TypeId) -> Members {
        let ty = self.registry.non_optional(ty);
        if let Some(members) = self.members.get(&ty) {
            return members;
        }

        let members: Members = match self.registry.get_struct(ty) {
            Some(info) => info
                .members()
                .iter()
                .map(|member| Arc::new(QualifiedMember::root(&self.registry, ty, member)))
                .collect(),
            None => Arc::new([]),
        };
        trace!("enumerated {} members of `{}`", members.len(), self.registry.path_of(ty));
        self.members.get_or_insert(ty, members)
    }

    /// The readable member paths of `ty`, shortest paths first, then in
    /// declaration order.
    ///
    /// Complex members are followed up to [`MAX_PATH_DEPTH`]. Below a member
    /// whose declared type has subtypes, the members those subtypes add are
    /// listed as narrowed paths.
    pub fn source_paths_of(&self, ty: TypeId) -> Members {
        let ty = self.registry.non_optional(ty);
        if let Some(paths) = self.paths.get(&ty) {
            return paths;
        }

        let registry = &*self.registry;
        let mut paths: Vec<Arc<QualifiedMember>> = self
            .members_of(ty)
            .iter()
            .filter(|member| member.is_readable())
            .cloned()
            .collect();

        let mut index = 0;
        while index < paths.len() {
            let parent = paths[index].clone();
            index += 1;
            if parent.depth() >= MAX_PATH_DEPTH || parent.kind() != TypeKind::Complex {
                continue;
            }
            let declared = registry.non_optional(parent.ty());
            let Some(info) = registry.get_struct(declared) else {
                continue;
            };

            for member in info.members().iter().filter(|member| member.is_readable()) {
                paths.push(Arc::new(QualifiedMember::child(registry, &parent, declared, member)));
            }
            for subtype in registry.subtypes_of(declared) {
                let Some(sub_info) = registry.get_struct(subtype) else {
                    continue;
                };
                for member in sub_info
                    .members()
                    .iter()
                    .filter(|member| member.declaring_type() == subtype && member.is_readable())
                {
                    paths.push(Arc::new(QualifiedMember::child(registry, &parent, subtype, member)));
                }
            }
        }

        self.paths.get_or_insert(ty, paths.into())
    }
}
