//! End-to-end mappings through [`Mapper`].

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use vc_schema::Value;
use vc_schema::info::TypeId;
use vc_schema::registry::{StructBuilder, TypeRegistry};
use vc_schema::value::{DictionaryRef, ListRef, ObjectRef};

use crate::config::{
    ConfiguredDataSource, ConfiguredValue, DerivedTypePair, Ignore, MapperConfig, MappingScope, SettingsOverride,
};
use crate::plan::MapperKey;
use crate::{ConfigurationError, ExecutionCause, Mapper, MappingError, RuleSet};

fn object(value: &Value) -> &ObjectRef {
    value.as_object().expect("an object")
}

fn member(value: &Value, name: &str) -> Value {
    object(value).get_member(name).expect("a member")
}

// -----------------------------------------------------------------------------
// Customers

struct Crm {
    registry: Arc<TypeRegistry>,
    address: TypeId,
    customer: TypeId,
    address_dto: TypeId,
    customer_dto: TypeId,
    flat_dto: TypeId,
}

fn crm() -> Crm {
    let mut registry = TypeRegistry::new();
    let address = registry
        .register_struct(
            StructBuilder::new("crm::Address")
                .member("Line1", TypeId::STRING)
                .member("Line2", TypeId::STRING),
        )
        .unwrap();
    let customer = registry
        .register_struct(
            StructBuilder::new("crm::Customer")
                .member("Name", TypeId::STRING)
                .member("Age", TypeId::I32)
                .member("Address", address),
        )
        .unwrap();
    let address_dto = registry
        .register_struct(
            StructBuilder::new("crm::AddressDto")
                .member("Line1", TypeId::STRING)
                .member("Line2", TypeId::STRING),
        )
        .unwrap();
    let customer_dto = registry
        .register_struct(
            StructBuilder::new("crm::CustomerDto")
                .member("Name", TypeId::STRING)
                .member("Age", TypeId::I64)
                .member("Email", TypeId::STRING)
                .member("Address", address_dto),
        )
        .unwrap();
    let flat_dto = registry
        .register_struct(
            StructBuilder::new("crm::FlatCustomerDto")
                .member("Name", TypeId::STRING)
                .member("AddressLine1", TypeId::STRING),
        )
        .unwrap();
    Crm {
        registry: Arc::new(registry),
        address,
        customer,
        address_dto,
        customer_dto,
        flat_dto,
    }
}

impl Crm {
    fn customer(&self, name: &str, line1: &str) -> Value {
        let address = self
            .registry
            .new_object(self.address, [("Line1", Value::from(line1)), ("Line2", Value::from("Flat 2"))])
            .unwrap();
        let customer = self
            .registry
            .new_object(self.customer, [
                ("Name", Value::from(name)),
                ("Age", Value::from(42)),
                ("Address", Value::Object(address)),
            ])
            .unwrap();
        Value::Object(customer)
    }

    fn mapper(self, config: MapperConfig) -> (Mapper, Self) {
        (Mapper::new(self.registry.clone(), config).unwrap(), self)
    }
}

#[test]
fn structural_members_and_fallbacks() {
    let (mapper, crm) = crm().mapper(MapperConfig::new());
    let source = crm.customer("Ada", "1 Main Street");

    let dto = mapper.map(&source).to_new(crm.customer_dto).unwrap();
    assert_eq!(object(&dto).type_id(), crm.customer_dto);
    assert_eq!(member(&dto, "Name"), Value::from("Ada"));
    assert_eq!(member(&dto, "Age"), Value::Int(42));
    // no source member, the default is used
    assert_eq!(member(&dto, "Email"), mapper.registry().default_value(TypeId::STRING));

    let address = member(&dto, "Address");
    assert_eq!(object(&address).type_id(), crm.address_dto);
    assert_eq!(member(&address, "Line1"), Value::from("1 Main Street"));
}

#[test]
fn merge_and_overwrite_keep_unsourced_members() {
    let (mapper, crm) = crm().mapper(MapperConfig::new());
    let source = crm.customer("Ada", "1 Main Street");

    let existing = mapper
        .registry()
        .new_object(crm.customer_dto, [
            ("Name", Value::from("Grace")),
            ("Email", Value::from("grace@example.com")),
        ])
        .unwrap();
    let existing = Value::Object(existing);

    let merged = mapper.map(&source).on_to(&existing).unwrap();
    assert!(merged.same(&existing));
    // set members are kept when merging
    assert_eq!(member(&merged, "Name"), Value::from("Grace"));
    assert_eq!(member(&merged, "Age"), Value::Int(42));
    assert_eq!(member(&merged, "Email"), Value::from("grace@example.com"));

    let overwritten = mapper.map(&source).over(&existing).unwrap();
    assert!(overwritten.same(&existing));
    assert_eq!(member(&overwritten, "Name"), Value::from("Ada"));
    assert_eq!(member(&overwritten, "Email"), Value::from("grace@example.com"));
}

#[test]
fn configured_sources_win() {
    let crm = crm();
    let mut config = MapperConfig::new();
    config
        .add_data_source(ConfiguredDataSource::new(
            MappingScope::pair(crm.customer, crm.customer_dto),
            ConfiguredValue::constant("redacted"),
            "Name",
        ))
        .add_data_source(ConfiguredDataSource::new(
            MappingScope::pair(crm.customer, crm.customer_dto),
            ConfiguredValue::function(TypeId::STRING, |args| {
                let name = args.source_member("Name");
                Ok(Value::from(format!("{}@example.com", name.as_str().unwrap_or_default().to_lowercase())))
            }),
            "Email",
        ));
    let (mapper, crm) = crm.mapper(config);

    let dto = mapper.map(&crm.customer("Ada", "x")).to_new(crm.customer_dto).unwrap();
    assert_eq!(member(&dto, "Name"), Value::from("redacted"));
    assert_eq!(member(&dto, "Email"), Value::from("ada@example.com"));
}

#[test]
fn conditional_source_falls_back_to_structural() {
    let crm = crm();
    let mut config = MapperConfig::new();
    config.add_data_source(
        ConfiguredDataSource::new(MappingScope::ALL, ConfiguredValue::constant("minor"), "Name")
            .when(|args| args.source_member("Age").as_i64().is_some_and(|age| age < 18)),
    );
    let (mapper, crm) = crm.mapper(config);

    let dto = mapper.map(&crm.customer("Ada", "x")).to_new(crm.customer_dto).unwrap();
    assert_eq!(member(&dto, "Name"), Value::from("Ada"));
}

#[test]
fn unconditional_sources_in_one_scope_conflict() {
    let crm = crm();
    let scope = MappingScope::pair(crm.customer, crm.customer_dto);
    let mut config = MapperConfig::new();
    config
        .add_data_source(ConfiguredDataSource::new(scope, ConfiguredValue::constant("a"), "Name"))
        .add_data_source(ConfiguredDataSource::new(scope, ConfiguredValue::constant("b"), "Name"));
    let (mapper, crm) = crm.mapper(config);

    let error = mapper
        .prebuild(crm.customer, crm.customer_dto, RuleSet::CreateNew)
        .unwrap_err();
    match error {
        ConfigurationError::Conflict { member, .. } => assert_eq!(&*member, "Name"),
        other => panic!("unexpected error: {other}"),
    }
    // a failed plan is not cached
    assert_eq!(mapper.cached_plans(), 0);
}

#[test]
fn duplicate_ignores_in_one_scope_conflict() {
    let crm = crm();
    let scope = MappingScope::pair(crm.customer, crm.customer_dto);
    let mut config = MapperConfig::new();
    config
        .ignore(Ignore::member(scope, "Name"))
        .ignore(Ignore::member(scope, "name"));
    let (mapper, crm) = crm.mapper(config);

    let error = mapper
        .prebuild(crm.customer, crm.customer_dto, RuleSet::CreateNew)
        .unwrap_err();
    match error {
        ConfigurationError::Conflict { member, .. } => assert_eq!(&*member, "Name"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn ignores_in_distinct_scopes_combine() {
    let crm = crm();
    let mut config = MapperConfig::new();
    config
        .ignore(Ignore::member(MappingScope::ALL, "Name"))
        .ignore(Ignore::member(MappingScope::pair(crm.customer, crm.customer_dto), "Name"));
    let (mapper, crm) = crm.mapper(config);

    let dto = mapper.map(&crm.customer("Ada", "x")).to_new(crm.customer_dto).unwrap();
    assert_eq!(member(&dto, "Name"), mapper.registry().default_value(TypeId::STRING));
    assert_eq!(member(&dto, "Age"), Value::Int(42));
}

#[test]
fn sequential_sources_apply_in_order() {
    let crm = crm();
    let scope = MappingScope::pair(crm.customer, crm.customer_dto);
    let mut config = MapperConfig::new();
    config
        .add_data_source(ConfiguredDataSource::new(scope, ConfiguredValue::member("Name"), "Name").sequential())
        .add_data_source(
            ConfiguredDataSource::new(scope, ConfiguredValue::constant("minor"), "Name")
                .sequential()
                .when(|args| args.source_member("Age").as_i64().is_some_and(|age| age < 18)),
        )
        .add_data_source(
            ConfiguredDataSource::new(
                scope,
                ConfiguredValue::function(TypeId::STRING, |args| {
                    let target = args.target().as_object().ok_or("no target")?;
                    let name = target.get_member("Name").unwrap_or_default();
                    Ok(Value::from(format!("{} (vip)", name.as_str().unwrap_or_default())))
                }),
                "Name",
            )
            .sequential(),
        );
    let (mapper, crm) = crm.mapper(config);

    // no conflict between unconditional sequential sources
    let dto = mapper.map(&crm.customer("Ada", "x")).to_new(crm.customer_dto).unwrap();
    assert_eq!(member(&dto, "Name"), Value::from("Ada (vip)"));
}

#[test]
fn whole_target_sources_populate_members() {
    let mut registry = TypeRegistry::new();
    let customer = registry
        .register_struct(
            StructBuilder::new("crm::Customer")
                .member("Name", TypeId::STRING)
                .member("Email", TypeId::STRING),
        )
        .unwrap();
    let order = registry
        .register_struct(
            StructBuilder::new("shop::Order")
                .member("Number", TypeId::I32)
                .member("Customer", customer),
        )
        .unwrap();
    let order_dto = registry
        .register_struct(
            StructBuilder::new("shop::OrderDto")
                .member("Number", TypeId::I32)
                .member("Name", TypeId::STRING)
                .member("Email", TypeId::STRING),
        )
        .unwrap();
    let mut config = MapperConfig::new();
    config.add_data_source(ConfiguredDataSource::to_target(
        MappingScope::pair(order, order_dto),
        ConfiguredValue::member("Customer"),
    ));
    let mapper = Mapper::new(Arc::new(registry), config).unwrap();
    let registry = mapper.registry();

    let ada = registry
        .new_object(customer, [
            ("Name", Value::from("Ada")),
            ("Email", Value::from("ada@example.com")),
        ])
        .unwrap();
    let source = registry
        .new_object(order, [("Number", Value::from(7)), ("Customer", Value::Object(ada))])
        .unwrap();

    let dto = mapper.map(&Value::Object(source)).to_new(order_dto).unwrap();
    assert_eq!(member(&dto, "Number"), Value::Int(7));
    assert_eq!(member(&dto, "Name"), Value::from("Ada"));
    assert_eq!(member(&dto, "Email"), Value::from("ada@example.com"));
}

#[test]
fn read_only_members_are_updated_in_place() {
    let mut registry = TypeRegistry::new();
    let address = registry
        .register_struct(StructBuilder::new("crm::Address").member("Line1", TypeId::STRING))
        .unwrap();
    let customer = registry
        .register_struct(
            StructBuilder::new("crm::Customer")
                .member("Name", TypeId::STRING)
                .member("Address", address),
        )
        .unwrap();
    let address_dto = registry
        .register_struct(StructBuilder::new("crm::AddressDto").member("Line1", TypeId::STRING))
        .unwrap();
    let view = registry
        .register_struct(
            StructBuilder::new("crm::CustomerView")
                .member("Name", TypeId::STRING)
                .readonly_member("Address", address_dto),
        )
        .unwrap();
    let mut config = MapperConfig::new();
    config.after_create(MappingScope::to(view), move |args| {
        let address = args.registry().new_object(address_dto, [])?;
        let target = args.target().as_object().ok_or("no target")?;
        target.set_member("Address", Value::Object(address))?;
        Ok(())
    });
    let mapper = Mapper::new(Arc::new(registry), config).unwrap();
    let registry = mapper.registry();

    let customer_at = |line1: &str| {
        let line = registry.new_object(address, [("Line1", Value::from(line1))]).unwrap();
        let source = registry
            .new_object(customer, [("Name", Value::from("Ada")), ("Address", Value::Object(line))])
            .unwrap();
        Value::Object(source)
    };

    let created = mapper.map(&customer_at("1 Main Street")).to_new(view).unwrap();
    assert_eq!(member(&member(&created, "Address"), "Line1"), Value::from("1 Main Street"));

    let kept = Value::Object(registry.new_object(address_dto, []).unwrap());
    let existing = Value::Object(registry.new_object(view, [("Address", kept.clone())]).unwrap());
    mapper.map(&customer_at("2 Side Street")).over(&existing).unwrap();
    let address = member(&existing, "Address");
    assert!(address.same(&kept));
    assert_eq!(member(&address, "Line1"), Value::from("2 Side Street"));
}

#[test]
fn flattening_and_unflattening() {
    let (mapper, crm) = crm().mapper(MapperConfig::new());

    let flat = mapper.map(&crm.customer("Ada", "1 Main Street")).to_new(crm.flat_dto).unwrap();
    assert_eq!(member(&flat, "AddressLine1"), Value::from("1 Main Street"));

    let customer = mapper.map(&flat).to_new(crm.customer).unwrap();
    assert_eq!(member(&customer, "Name"), Value::from("Ada"));
    let address = member(&customer, "Address");
    assert_eq!(object(&address).type_id(), crm.address);
    assert_eq!(member(&address, "Line1"), Value::from("1 Main Street"));
}

#[test]
fn failures_are_wrapped_per_mapping() {
    let crm = crm();
    let mut config = MapperConfig::new();
    config.add_data_source(ConfiguredDataSource::new(
        MappingScope::pair(crm.address, crm.address_dto),
        ConfiguredValue::function(TypeId::STRING, |_| Err("no such street".into())),
        "Line1",
    ));
    let (mapper, crm) = crm.mapper(config);

    let error = mapper
        .map(&crm.customer("Ada", "x"))
        .to_new(crm.customer_dto)
        .unwrap_err();
    let MappingError::Execution(error) = error else {
        panic!("unexpected error: {error}");
    };
    assert_eq!(error.source_type(), "crm::Customer");
    assert_eq!(error.target_type(), "crm::CustomerDto");
    assert_eq!(error.member_path(), Some("Address"));
    assert_eq!(error.contexts().count(), 2);

    let innermost = error.innermost();
    assert_eq!(innermost.source_type(), "crm::Address");
    assert_eq!(innermost.member_path(), Some("Line1"));
    assert!(matches!(innermost.cause(), ExecutionCause::Callback(_)));
}

#[test]
fn swallowed_failures_are_reported() {
    let crm = crm();
    let reported = Arc::new(AtomicUsize::new(0));
    let scope = MappingScope::pair(crm.address, crm.address_dto);
    let mut config = MapperConfig::new();
    config
        .add_data_source(ConfiguredDataSource::new(
            scope,
            ConfiguredValue::function(TypeId::STRING, |_| Err("no such street".into())),
            "Line1",
        ))
        .swallow_errors(scope)
        .on_error(scope, {
            let reported = reported.clone();
            move |_, _| {
                reported.fetch_add(1, Ordering::Relaxed);
            }
        });
    let (mapper, crm) = crm.mapper(config);

    let dto = mapper.map(&crm.customer("Ada", "x")).to_new(crm.customer_dto).unwrap();
    assert_eq!(member(&dto, "Name"), Value::from("Ada"));
    assert_eq!(member(&dto, "Address"), Value::Null);
    assert_eq!(reported.load(Ordering::Relaxed), 1);
}

#[test]
fn creation_callbacks() {
    let crm = crm();
    let created = Arc::new(AtomicUsize::new(0));
    let mut config = MapperConfig::new();
    config
        .before_create(MappingScope::to(crm.customer_dto), |args| {
            assert!(args.target().is_null());
            Ok(())
        })
        .after_create(MappingScope::ALL, {
            let created = created.clone();
            move |args| {
                assert!(args.target().as_object().is_some());
                created.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
        });
    let (mapper, crm) = crm.mapper(config);

    mapper.map(&crm.customer("Ada", "x")).to_new(crm.customer_dto).unwrap();
    // the customer and its address
    assert_eq!(created.load(Ordering::Relaxed), 2);
}

// -----------------------------------------------------------------------------
// Dictionaries

#[test]
fn dictionary_entries_populate_members() {
    let mut registry = TypeRegistry::new();
    let address = registry
        .register_struct(
            StructBuilder::new("crm::Address")
                .member("Line1", TypeId::STRING)
                .member("Line2", TypeId::STRING),
        )
        .unwrap();
    let strings = registry.dictionary_of(TypeId::STRING).unwrap();
    let mapper = Mapper::new(Arc::new(registry), MapperConfig::new()).unwrap();

    let full = DictionaryRef::from_entries(strings, [("line1", "A"), ("LINE2", "B")]);
    let mapped = mapper.map(&Value::Dictionary(full)).to_new(address).unwrap();
    assert_eq!(member(&mapped, "Line1"), Value::from("A"));
    assert_eq!(member(&mapped, "Line2"), Value::from("B"));

    let partial = DictionaryRef::from_entries(strings, [("Line1", "A")]);
    let mapped = mapper.map(&Value::Dictionary(partial)).to_new(address).unwrap();
    assert_eq!(member(&mapped, "Line1"), Value::from("A"));
    assert_eq!(member(&mapped, "Line2"), mapper.registry().default_value(TypeId::STRING));
}

#[test]
fn dictionaries_merge_by_key() {
    let mut registry = TypeRegistry::new();
    let numbers = registry.dictionary_of(TypeId::I32).unwrap();
    let holder = registry
        .register_struct(StructBuilder::new("app::Scores").member("Scores", numbers))
        .unwrap();
    let mapper = Mapper::new(Arc::new(registry), MapperConfig::new()).unwrap();
    let registry = mapper.registry();

    let scores = DictionaryRef::from_entries(numbers, [("ada", 3), ("grace", 5)]);
    let source = registry.new_object(holder, [("Scores", Value::Dictionary(scores))]).unwrap();
    let kept = DictionaryRef::from_entries(numbers, [("Ada", 1), ("Linus", 2)]);
    let existing = registry
        .new_object(holder, [("Scores", Value::Dictionary(kept.clone()))])
        .unwrap();

    mapper.map(&Value::Object(source.clone())).on_to(&Value::Object(existing.clone())).unwrap();
    assert_eq!(kept.get("Ada"), Some(Value::Int(1)));
    assert_eq!(kept.get("Linus"), Some(Value::Int(2)));
    assert_eq!(kept.get("grace"), Some(Value::Int(5)));

    mapper.map(&Value::Object(source)).over(&Value::Object(existing)).unwrap();
    assert_eq!(kept.get("Ada"), Some(Value::Int(3)));
    assert_eq!(kept.get("Linus"), None);
    assert_eq!(kept.len(), 2);
}

#[test]
fn indexed_entries_become_elements() {
    let mut registry = TypeRegistry::new();
    let line = registry
        .register_struct(
            StructBuilder::new("shop::Line")
                .member("Id", TypeId::I32)
                .member("Quantity", TypeId::I32),
        )
        .unwrap();
    let lines = registry.list_of(line).unwrap();
    let tags = registry.list_of(TypeId::STRING).unwrap();
    let order = registry
        .register_struct(StructBuilder::new("shop::Order").member("Tags", tags).member("Lines", lines))
        .unwrap();
    let entries = registry.dictionary_of(TypeId::ANY).unwrap();
    let mapper = Mapper::new(Arc::new(registry), MapperConfig::new()).unwrap();

    let source = DictionaryRef::from_entries(entries, [
        ("Tags[0]", Value::from("new")),
        ("tags[1]", Value::from("paid")),
        // the gap ends the elements
        ("Tags[3]", Value::from("lost")),
        ("Lines[0].Id", Value::from(1)),
        ("Lines[0].Quantity", Value::from(10)),
        ("Lines[1].Id", Value::from(2)),
        ("Lines[1].Quantity", Value::from(20)),
    ]);
    let mapped = mapper.map(&Value::Dictionary(source)).to_new(order).unwrap();

    let tags = member(&mapped, "Tags");
    assert_eq!(tags.as_list().unwrap().snapshot(), [Value::from("new"), Value::from("paid")]);
    assert_eq!(quantities(&mapped), [(1, 10), (2, 20)]);
}

#[test]
fn objects_flatten_into_dictionaries() {
    let mut registry = TypeRegistry::new();
    let address = registry
        .register_struct(
            StructBuilder::new("crm::Address")
                .member("Line1", TypeId::STRING)
                .member("Line2", TypeId::STRING),
        )
        .unwrap();
    let customer = registry
        .register_struct(
            StructBuilder::new("crm::Customer")
                .member("Name", TypeId::STRING)
                .member("Address", address),
        )
        .unwrap();
    let strings = registry.dictionary_of(TypeId::STRING).unwrap();
    let card = registry
        .register_struct(
            StructBuilder::new("crm::CustomerCard")
                .member("Name", TypeId::STRING)
                .member("Address", strings),
        )
        .unwrap();
    let mapper = Mapper::new(Arc::new(registry), MapperConfig::new()).unwrap();
    let registry = mapper.registry();

    let line = registry
        .new_object(address, [("Line1", Value::from("1 Main Street")), ("Line2", Value::from("Flat 2"))])
        .unwrap();
    let source = registry
        .new_object(customer, [("Name", Value::from("Ada")), ("Address", Value::Object(line))])
        .unwrap();
    let source = Value::Object(source);

    let mapped = mapper.map(&source).to_new(card).unwrap();
    let address = member(&mapped, "Address");
    let address = address.as_dictionary().unwrap();
    assert_eq!(address.get("Line1"), Some(Value::from("1 Main Street")));
    assert_eq!(address.get("Line2"), Some(Value::from("Flat 2")));
    assert_eq!(address.len(), 2);

    let flat = mapper.map(&source).to_new(strings).unwrap();
    let flat = flat.as_dictionary().unwrap();
    assert_eq!(flat.get("Name"), Some(Value::from("Ada")));
    assert_eq!(flat.get("Address.Line1"), Some(Value::from("1 Main Street")));

    // merging keeps the entries already set, whatever their case
    let existing = DictionaryRef::from_entries(strings, [("name", "Grace")]);
    mapper.map(&source).on_to(&Value::Dictionary(existing.clone())).unwrap();
    assert_eq!(existing.get("name"), Some(Value::from("Grace")));
    assert_eq!(existing.get("Name"), None);
    assert_eq!(existing.get("Address.Line2"), Some(Value::from("Flat 2")));
}

// -----------------------------------------------------------------------------
// Collections

struct Shop {
    mapper: Mapper,
    line: TypeId,
    order: TypeId,
    line_dto: TypeId,
    order_dto: TypeId,
}

fn shop() -> Shop {
    let mut registry = TypeRegistry::new();
    let line = registry
        .register_struct(
            StructBuilder::new("shop::Line")
                .member("Id", TypeId::I32)
                .member("Quantity", TypeId::I32),
        )
        .unwrap();
    let lines = registry.list_of(line).unwrap();
    let order = registry
        .register_struct(StructBuilder::new("shop::Order").member("Lines", lines))
        .unwrap();
    let line_dto = registry
        .register_struct(
            StructBuilder::new("shop::LineDto")
                .member("Id", TypeId::I64)
                .member("Quantity", TypeId::I64),
        )
        .unwrap();
    let line_dtos = registry.list_of(line_dto).unwrap();
    let order_dto = registry
        .register_struct(StructBuilder::new("shop::OrderDto").member("Lines", line_dtos))
        .unwrap();
    Shop {
        mapper: Mapper::new(Arc::new(registry), MapperConfig::new()).unwrap(),
        line,
        order,
        line_dto,
        order_dto,
    }
}

impl Shop {
    fn lines(&self, ty: TypeId, lines: &[(i32, i32)]) -> Value {
        let registry = self.mapper.registry();
        let items = lines
            .iter()
            .map(|&(id, quantity)| {
                let line = registry
                    .new_object(ty, [("Id", Value::from(id)), ("Quantity", Value::from(quantity))])
                    .unwrap();
                Value::Object(line)
            })
            .collect();
        let list = registry.find_list(ty).unwrap();
        Value::List(ListRef::new(list, items))
    }

    fn order(&self, ty: TypeId, line: TypeId, lines: &[(i32, i32)]) -> Value {
        let order = self
            .mapper
            .registry()
            .new_object(ty, [("Lines", self.lines(line, lines))])
            .unwrap();
        Value::Object(order)
    }
}

fn quantities(order: &Value) -> Vec<(i64, i64)> {
    let lines = member(order, "Lines");
    lines
        .as_list()
        .unwrap()
        .snapshot()
        .iter()
        .map(|line| {
            let id = member(line, "Id").as_i64().unwrap();
            let quantity = member(line, "Quantity").as_i64().unwrap();
            (id, quantity)
        })
        .collect()
}

#[test]
fn new_collections() {
    let shop = shop();
    let source = shop.order(shop.order, shop.line, &[(1, 10), (2, 20)]);

    let dto = shop.mapper.map(&source).to_new(shop.order_dto).unwrap();
    assert_eq!(quantities(&dto), [(1, 10), (2, 20)]);
}

#[test]
fn merged_collections_match_identifiers() {
    let shop = shop();
    let source = shop.order(shop.order, shop.line, &[(1, 10), (2, 20)]);
    let existing = shop.order(shop.order_dto, shop.line_dto, &[(1, 0), (3, 30)]);

    shop.mapper.map(&source).on_to(&existing).unwrap();
    assert_eq!(quantities(&existing), [(1, 10), (3, 30), (2, 20)]);
}

#[test]
fn overwritten_collections_take_source_order() {
    let shop = shop();
    let source = shop.order(shop.order, shop.line, &[(2, 20), (1, 10)]);
    let existing = shop.order(shop.order_dto, shop.line_dto, &[(1, 5), (3, 30)]);
    let kept = member(&existing, "Lines").as_list().unwrap().get(0).unwrap();

    shop.mapper.map(&source).over(&existing).unwrap();
    assert_eq!(quantities(&existing), [(2, 20), (1, 10)]);
    // the matched element is updated in place
    let lines = member(&existing, "Lines");
    assert!(lines.as_list().unwrap().get(1).unwrap().same(&kept));
}

#[test]
fn back_referencing_elements_map_in_identifier_order() {
    let mut registry = TypeRegistry::new();
    let order = registry.reserve("shop::Order");
    let line = registry
        .register_struct(
            StructBuilder::new("shop::Line")
                .member("Id", TypeId::I32)
                .member("Order", order),
        )
        .unwrap();
    let lines = registry.list_of(line).unwrap();
    registry
        .register_struct(StructBuilder::new("shop::Order").member("Lines", lines))
        .unwrap();
    let line_dto = registry
        .register_struct(StructBuilder::new("shop::LineDto").member("Id", TypeId::I64))
        .unwrap();
    let line_dtos = registry.list_of(line_dto).unwrap();
    let order_dto = registry
        .register_struct(StructBuilder::new("shop::OrderDto").member("Lines", line_dtos))
        .unwrap();
    let mapper = Mapper::new(Arc::new(registry), MapperConfig::new()).unwrap();
    let registry = mapper.registry();

    let source = registry.new_object(order, []).unwrap();
    let items = [3, 1, 2]
        .into_iter()
        .map(|id| {
            let line = registry
                .new_object(line, [("Id", Value::from(id)), ("Order", Value::Object(source.clone()))])
                .unwrap();
            Value::Object(line)
        })
        .collect();
    source.set_member("Lines", Value::List(ListRef::new(lines, items))).unwrap();

    let dto = mapper.map(&Value::Object(source)).to_new(order_dto).unwrap();
    let ids: Vec<i64> = member(&dto, "Lines")
        .as_list()
        .unwrap()
        .snapshot()
        .iter()
        .map(|line| member(line, "Id").as_i64().unwrap())
        .collect();
    assert_eq!(ids, [1, 2, 3]);
}

// -----------------------------------------------------------------------------
// Identity

struct People {
    mapper: Mapper,
    person: TypeId,
    person_dto: TypeId,
}

fn people(config: MapperConfig) -> People {
    let mut registry = TypeRegistry::new();
    let person = registry.reserve("app::Person");
    registry
        .register_struct(
            StructBuilder::new("app::Person")
                .member("Name", TypeId::STRING)
                .member("Friend", person)
                .member("Partner", person),
        )
        .unwrap();
    let person_dto = registry.reserve("app::PersonDto");
    registry
        .register_struct(
            StructBuilder::new("app::PersonDto")
                .member("Name", TypeId::STRING)
                .member("Friend", person_dto)
                .member("Partner", person_dto),
        )
        .unwrap();
    People {
        mapper: Mapper::new(Arc::new(registry), config).unwrap(),
        person,
        person_dto,
    }
}

impl People {
    fn person(&self, name: &str) -> ObjectRef {
        self.mapper
            .registry()
            .new_object(self.person, [("Name", Value::from(name))])
            .unwrap()
    }
}

#[test]
fn cycles_map_to_cycles() {
    let people = people(MapperConfig::new());
    let ada = people.person("Ada");
    let grace = people.person("Grace");
    ada.set_member("Friend", Value::Object(grace.clone())).unwrap();
    grace.set_member("Friend", Value::Object(ada.clone())).unwrap();

    let dto = people.mapper.map(&Value::Object(ada)).to_new(people.person_dto).unwrap();
    let friend = member(&dto, "Friend");
    assert_eq!(member(&friend, "Name"), Value::from("Grace"));
    assert!(member(&friend, "Friend").same(&dto));
}

#[test]
fn shared_sources_share_targets() {
    let people = people(MapperConfig::new());
    let ada = people.person("Ada");
    let grace = people.person("Grace");
    ada.set_member("Friend", Value::Object(grace.clone())).unwrap();
    ada.set_member("Partner", Value::Object(grace)).unwrap();

    let dto = people.mapper.map(&Value::Object(ada)).to_new(people.person_dto).unwrap();
    assert!(member(&dto, "Friend").same(&member(&dto, "Partner")));
}

#[test]
fn without_identity_integrity_targets_are_distinct() {
    let mut config = MapperConfig::new();
    config.override_settings(MappingScope::ALL, SettingsOverride::default().identity_integrity(false));
    let people = people(config);

    let ada = people.person("Ada");
    let grace = people.person("Grace");
    ada.set_member("Friend", Value::Object(grace.clone())).unwrap();
    ada.set_member("Partner", Value::Object(grace)).unwrap();

    let dto = people.mapper.map(&Value::Object(ada)).to_new(people.person_dto).unwrap();
    let (friend, partner) = (member(&dto, "Friend"), member(&dto, "Partner"));
    assert!(!friend.same(&partner));
    assert_eq!(member(&friend, "Name"), member(&partner, "Name"));
}

// -----------------------------------------------------------------------------
// Derived types

#[test]
fn derived_sources_map_to_derived_targets() {
    let mut registry = TypeRegistry::new();
    let animal = registry
        .register_struct(StructBuilder::new("zoo::Animal").member("Name", TypeId::STRING))
        .unwrap();
    let dog = registry
        .register_struct(StructBuilder::new("zoo::Dog").extends(animal).member("Breed", TypeId::STRING))
        .unwrap();
    let keeper = registry
        .register_struct(StructBuilder::new("zoo::Keeper").member("Favourite", animal))
        .unwrap();
    let animal_dto = registry
        .register_struct(StructBuilder::new("api::AnimalModel").member("Name", TypeId::STRING))
        .unwrap();
    let dog_dto = registry
        .register_struct(
            StructBuilder::new("api::HoundModel")
                .extends(animal_dto)
                .member("Breed", TypeId::STRING),
        )
        .unwrap();
    let keeper_dto = registry
        .register_struct(StructBuilder::new("api::KeeperModel").member("Favourite", animal_dto))
        .unwrap();

    // the names do not pair, the pair is configured
    let mut config = MapperConfig::new();
    config.add_derived_pair(DerivedTypePair::new(animal, animal_dto, dog, dog_dto));
    let mapper = Mapper::new(Arc::new(registry), config).unwrap();
    let registry = mapper.registry();

    let rex = registry
        .new_object(dog, [("Name", Value::from("Rex")), ("Breed", Value::from("Collie"))])
        .unwrap();
    let source = registry.new_object(keeper, [("Favourite", Value::Object(rex))]).unwrap();
    let mapped = mapper.map(&Value::Object(source)).to_new(keeper_dto).unwrap();
    let favourite = member(&mapped, "Favourite");
    assert_eq!(object(&favourite).type_id(), dog_dto);
    assert_eq!(member(&favourite, "Breed"), Value::from("Collie"));

    let cat = registry.new_object(animal, [("Name", Value::from("Tom"))]).unwrap();
    let source = registry.new_object(keeper, [("Favourite", Value::Object(cat))]).unwrap();
    let mapped = mapper.map(&Value::Object(source)).to_new(keeper_dto).unwrap();
    let favourite = member(&mapped, "Favourite");
    assert_eq!(object(&favourite).type_id(), animal_dto);
    assert_eq!(member(&favourite, "Name"), Value::from("Tom"));
}

#[test]
fn nested_derived_sources_keep_their_members() {
    let mut registry = TypeRegistry::new();
    let animal = registry
        .register_struct(StructBuilder::new("zoo::Animal").member("Name", TypeId::STRING))
        .unwrap();
    let dog = registry
        .register_struct(StructBuilder::new("zoo::Dog").extends(animal).member("Breed", TypeId::STRING))
        .unwrap();
    let keeper = registry
        .register_struct(StructBuilder::new("zoo::Keeper").member("Favourite", animal))
        .unwrap();
    // no target type pairs with `Dog`
    let animal_dto = registry
        .register_struct(
            StructBuilder::new("zoo::AnimalDto")
                .member("Name", TypeId::STRING)
                .member("Breed", TypeId::STRING),
        )
        .unwrap();
    let keeper_dto = registry
        .register_struct(StructBuilder::new("zoo::KeeperDto").member("Favourite", animal_dto))
        .unwrap();
    let mapper = Mapper::new(Arc::new(registry), MapperConfig::new()).unwrap();
    let registry = mapper.registry();

    let rex = registry
        .new_object(dog, [("Name", Value::from("Rex")), ("Breed", Value::from("Collie"))])
        .unwrap();
    let direct = mapper.map(&Value::Object(rex.clone())).to_new(animal_dto).unwrap();
    assert_eq!(member(&direct, "Breed"), Value::from("Collie"));

    let source = registry.new_object(keeper, [("Favourite", Value::Object(rex))]).unwrap();
    let mapped = mapper.map(&Value::Object(source)).to_new(keeper_dto).unwrap();
    let favourite = member(&mapped, "Favourite");
    assert_eq!(object(&favourite).type_id(), animal_dto);
    assert_eq!(member(&favourite, "Name"), Value::from("Rex"));
    assert_eq!(member(&favourite, "Breed"), Value::from("Collie"));
}

#[test]
fn untyped_sources_cache_a_plan_per_runtime_type() {
    let mut registry = TypeRegistry::new();
    let address = registry
        .register_struct(StructBuilder::new("crm::Address").member("Line1", TypeId::STRING))
        .unwrap();
    let address_dto = registry
        .register_struct(StructBuilder::new("crm::AddressDto").member("Line1", TypeId::STRING))
        .unwrap();
    let envelope = registry
        .register_struct(StructBuilder::new("app::Envelope").member("Payload", TypeId::ANY))
        .unwrap();
    let envelope_dto = registry
        .register_struct(StructBuilder::new("app::EnvelopeDto").member("Payload", address_dto))
        .unwrap();
    let mapper = Mapper::new(Arc::new(registry), MapperConfig::new()).unwrap();
    let registry = mapper.registry();

    let envelope_of = |ty: TypeId, line1: &str| {
        let payload = registry.new_object(ty, [("Line1", Value::from(line1))]).unwrap();
        let envelope = registry
            .new_object(envelope, [("Payload", Value::Object(payload))])
            .unwrap();
        Value::Object(envelope)
    };
    let declared = MapperKey::new(TypeId::ANY, address_dto, RuleSet::CreateNew);
    let plans = &mapper.inner().plans;

    let mapped = mapper.map(&envelope_of(address, "Main")).to_new(envelope_dto).unwrap();
    assert_eq!(member(&member(&mapped, "Payload"), "Line1"), Value::from("Main"));
    assert!(plans.get(&declared, Some(address)).is_some());
    // a key hit alone does not match another runtime type
    assert!(plans.get(&declared, Some(address_dto)).is_none());
    assert!(plans.get(&declared, None).is_none());

    let mapped = mapper.map(&envelope_of(address_dto, "Side")).to_new(envelope_dto).unwrap();
    assert_eq!(member(&member(&mapped, "Payload"), "Line1"), Value::from("Side"));
    let from_address = plans.get(&declared, Some(address)).unwrap();
    let from_dto = plans.get(&declared, Some(address_dto)).unwrap();
    assert!(!Arc::ptr_eq(&from_address, &from_dto));
    assert_eq!(from_dto.key.source, address_dto);
}

// -----------------------------------------------------------------------------
// Identifiers and reversal

#[test]
fn zero_identifiers_are_absent() {
    let mut registry = TypeRegistry::new();
    let order = registry
        .register_struct(StructBuilder::new("shop::Order").member("CustomerId", TypeId::I32))
        .unwrap();
    let optional_id = registry.optional_of(TypeId::I32).unwrap();
    let order_dto = registry
        .register_struct(StructBuilder::new("shop::OrderDto").member("CustomerId", optional_id))
        .unwrap();
    let mapper = Mapper::new(Arc::new(registry), MapperConfig::new()).unwrap();
    let registry = mapper.registry();

    let unset = registry.new_object(order, [("CustomerId", Value::from(0))]).unwrap();
    let dto = mapper.map(&Value::Object(unset)).to_new(order_dto).unwrap();
    assert_eq!(member(&dto, "CustomerId"), Value::Null);

    let set = registry.new_object(order, [("CustomerId", Value::from(7))]).unwrap();
    let dto = mapper.map(&Value::Object(set)).to_new(order_dto).unwrap();
    assert_eq!(member(&dto, "CustomerId"), Value::Int(7));
}

#[test]
fn reversible_sources_map_back() {
    let mut registry = TypeRegistry::new();
    let product = registry
        .register_struct(StructBuilder::new("shop::Product").member("Id", TypeId::I32))
        .unwrap();
    let price = registry
        .register_struct(StructBuilder::new("shop::Price").member("Value", TypeId::I32))
        .unwrap();
    let mut config = MapperConfig::new();
    config.add_data_source(
        ConfiguredDataSource::new(MappingScope::pair(product, price), ConfiguredValue::member("Id"), "Value")
            .reversible(),
    );
    let mapper = Mapper::new(Arc::new(registry), config).unwrap();

    let source = mapper.registry().new_object(product, [("Id", Value::from(12))]).unwrap();
    let mapped = mapper.map(&Value::Object(source)).to_new(price).unwrap();
    assert_eq!(member(&mapped, "Value"), Value::Int(12));

    let back = mapper.map(&mapped).to_new(product).unwrap();
    assert_eq!(member(&back, "Id"), Value::Int(12));
}
