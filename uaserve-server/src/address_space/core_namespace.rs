//! The namespace 0 bootstrap: the reference type hierarchy, the base data
//! types, the folder skeleton and the Server object.
//!
//! The population order matters: References and HasSubtype come first so
//! that every later HasSubtype reference can be tracked by the type tree.

use std::sync::Arc;

use uaserve_nodes::{
    AccessLevel, DataSource, DataTypeBuilder, ObjectBuilder, ObjectTypeBuilder,
    ReferenceTypeBuilder, VariableBuilder, VariableTypeBuilder, VALUE_RANK_ONE_DIMENSION,
};
use uaserve_types::{
    BuildInfo, ContextOwned, DataTypeId, DataValue, DateTime, ExtensionObject, NodeId, ObjectId,
    ObjectTypeId, ReferenceTypeId, ServerState, ServerStatusDataType, StatusCode, UAString,
    VariableId, VariableTypeId, Variant,
};

use super::AddressSpace;

/// Populate `space` with the core namespace and register `application_uri`
/// as namespace 1.
pub fn populate_core_namespace(space: &mut AddressSpace, application_uri: &str) {
    populate_reference_types(space);
    populate_data_types(space);
    populate_object_and_variable_types(space);
    populate_folders(space);
    populate_server_object(space, application_uri);

    space.register_namespace(application_uri);
}

fn reference_type(
    space: &mut AddressSpace,
    id: ReferenceTypeId,
    name: &str,
    inverse: Option<&str>,
    symmetric: bool,
    is_abstract: bool,
    supertype: Option<ReferenceTypeId>,
) {
    let mut b = ReferenceTypeBuilder::new(&id.into(), name, name)
        .symmetric(symmetric)
        .is_abstract(is_abstract);
    if let Some(inverse) = inverse {
        b = b.inverse_name(inverse);
    }
    if let Some(supertype) = supertype {
        b = b.subtype_of(supertype);
    }
    b.insert(space);
}

fn populate_reference_types(space: &mut AddressSpace) {
    use ReferenceTypeId::*;
    // References and HasSubtype before everything else, so subtype edges
    // of the remaining types land in a consistent tree.
    reference_type(space, References, "References", None, true, true, None);
    reference_type(
        space,
        HierarchicalReferences,
        "HierarchicalReferences",
        Some("InverseHierarchicalReferences"),
        false,
        true,
        Some(References),
    );
    reference_type(
        space,
        HasChild,
        "HasChild",
        Some("ChildOf"),
        false,
        true,
        Some(HierarchicalReferences),
    );
    reference_type(
        space,
        HasSubtype,
        "HasSubtype",
        Some("SubtypeOf"),
        false,
        false,
        Some(HasChild),
    );
    reference_type(
        space,
        NonHierarchicalReferences,
        "NonHierarchicalReferences",
        None,
        true,
        true,
        Some(References),
    );
    reference_type(
        space,
        Organizes,
        "Organizes",
        Some("OrganizedBy"),
        false,
        false,
        Some(HierarchicalReferences),
    );
    reference_type(
        space,
        HasEventSource,
        "HasEventSource",
        Some("EventSourceOf"),
        false,
        false,
        Some(HierarchicalReferences),
    );
    reference_type(
        space,
        HasNotifier,
        "HasNotifier",
        Some("NotifierOf"),
        false,
        false,
        Some(HasEventSource),
    );
    reference_type(
        space,
        Aggregates,
        "Aggregates",
        Some("AggregatedBy"),
        false,
        true,
        Some(HasChild),
    );
    reference_type(
        space,
        HasProperty,
        "HasProperty",
        Some("PropertyOf"),
        false,
        false,
        Some(Aggregates),
    );
    reference_type(
        space,
        HasComponent,
        "HasComponent",
        Some("ComponentOf"),
        false,
        false,
        Some(Aggregates),
    );
    reference_type(
        space,
        HasOrderedComponent,
        "HasOrderedComponent",
        Some("OrderedComponentOf"),
        false,
        false,
        Some(HasComponent),
    );
    reference_type(
        space,
        HasModellingRule,
        "HasModellingRule",
        Some("ModellingRuleOf"),
        false,
        false,
        Some(NonHierarchicalReferences),
    );
    reference_type(
        space,
        HasEncoding,
        "HasEncoding",
        Some("EncodingOf"),
        false,
        false,
        Some(NonHierarchicalReferences),
    );
    reference_type(
        space,
        HasDescription,
        "HasDescription",
        Some("DescriptionOf"),
        false,
        false,
        Some(NonHierarchicalReferences),
    );
    reference_type(
        space,
        HasTypeDefinition,
        "HasTypeDefinition",
        Some("TypeDefinitionOf"),
        false,
        false,
        Some(NonHierarchicalReferences),
    );
    reference_type(
        space,
        GeneratesEvent,
        "GeneratesEvent",
        Some("GeneratedBy"),
        false,
        false,
        Some(NonHierarchicalReferences),
    );
}

fn data_type(
    space: &mut AddressSpace,
    id: DataTypeId,
    name: &str,
    is_abstract: bool,
    supertype: DataTypeId,
) {
    DataTypeBuilder::new(&id.into(), name, name)
        .is_abstract(is_abstract)
        .subtype_of(supertype)
        .insert(space);
}

fn populate_data_types(space: &mut AddressSpace) {
    use DataTypeId::*;
    DataTypeBuilder::new(&BaseDataType.into(), "BaseDataType", "BaseDataType")
        .is_abstract(true)
        .insert(space);

    data_type(space, Boolean, "Boolean", false, BaseDataType);
    data_type(space, Number, "Number", true, BaseDataType);
    data_type(space, Integer, "Integer", true, Number);
    data_type(space, UInteger, "UInteger", true, Integer);
    data_type(space, SByte, "SByte", false, Integer);
    data_type(space, Int16, "Int16", false, Integer);
    data_type(space, Int32, "Int32", false, Integer);
    data_type(space, Int64, "Int64", false, Integer);
    data_type(space, Byte, "Byte", false, UInteger);
    data_type(space, UInt16, "UInt16", false, UInteger);
    data_type(space, UInt32, "UInt32", false, UInteger);
    data_type(space, UInt64, "UInt64", false, UInteger);
    data_type(space, Float, "Float", false, Number);
    data_type(space, Double, "Double", false, Number);
    data_type(space, String, "String", false, BaseDataType);
    data_type(space, DateTime, "DateTime", false, BaseDataType);
    data_type(space, Guid, "Guid", false, BaseDataType);
    data_type(space, ByteString, "ByteString", false, BaseDataType);
    data_type(space, XmlElement, "XmlElement", false, ByteString);
    data_type(space, NodeId, "NodeId", false, BaseDataType);
    data_type(space, ExpandedNodeId, "ExpandedNodeId", false, BaseDataType);
    data_type(space, StatusCode, "StatusCode", false, BaseDataType);
    data_type(space, QualifiedName, "QualifiedName", false, BaseDataType);
    data_type(space, LocalizedText, "LocalizedText", false, BaseDataType);
    data_type(space, Structure, "Structure", true, BaseDataType);
    data_type(space, DataValue, "DataValue", false, BaseDataType);
    data_type(space, DiagnosticInfo, "DiagnosticInfo", false, BaseDataType);
    data_type(space, Enumeration, "Enumeration", true, BaseDataType);
    data_type(space, Argument, "Argument", false, Structure);
    data_type(space, BuildInfo, "BuildInfo", false, Structure);
    data_type(
        space,
        ServerStatusDataType,
        "ServerStatusDataType",
        false,
        Structure,
    );
}

fn populate_object_and_variable_types(space: &mut AddressSpace) {
    ObjectTypeBuilder::new(
        &ObjectTypeId::BaseObjectType.into(),
        "BaseObjectType",
        "BaseObjectType",
    )
    .insert(space);
    ObjectTypeBuilder::new(&ObjectTypeId::FolderType.into(), "FolderType", "FolderType")
        .subtype_of(ObjectTypeId::BaseObjectType)
        .insert(space);
    ObjectTypeBuilder::new(
        &ObjectTypeId::ModellingRuleType.into(),
        "ModellingRuleType",
        "ModellingRuleType",
    )
    .subtype_of(ObjectTypeId::BaseObjectType)
    .insert(space);
    ObjectTypeBuilder::new(&ObjectTypeId::ServerType.into(), "ServerType", "ServerType")
        .subtype_of(ObjectTypeId::BaseObjectType)
        .insert(space);
    ObjectTypeBuilder::new(
        &ObjectTypeId::BaseEventType.into(),
        "BaseEventType",
        "BaseEventType",
    )
    .subtype_of(ObjectTypeId::BaseObjectType)
    .is_abstract(true)
    .insert(space);

    VariableTypeBuilder::new(
        &VariableTypeId::BaseVariableType.into(),
        "BaseVariableType",
        "BaseVariableType",
    )
    .is_abstract(true)
    .insert(space);
    VariableTypeBuilder::new(
        &VariableTypeId::BaseDataVariableType.into(),
        "BaseDataVariableType",
        "BaseDataVariableType",
    )
    .subtype_of(VariableTypeId::BaseVariableType)
    .insert(space);
    VariableTypeBuilder::new(
        &VariableTypeId::PropertyType.into(),
        "PropertyType",
        "PropertyType",
    )
    .subtype_of(VariableTypeId::BaseVariableType)
    .insert(space);

    ObjectBuilder::new(&ObjectId::ModellingRule_Mandatory.into(), "Mandatory", "Mandatory")
        .has_type_definition(ObjectTypeId::ModellingRuleType)
        .insert(space);
    ObjectBuilder::new(&ObjectId::ModellingRule_Optional.into(), "Optional", "Optional")
        .has_type_definition(ObjectTypeId::ModellingRuleType)
        .insert(space);
}

fn populate_folders(space: &mut AddressSpace) {
    ObjectBuilder::new(&ObjectId::RootFolder.into(), "Root", "Root")
        .has_type_definition(ObjectTypeId::FolderType)
        .insert(space);

    for (id, name) in [
        (ObjectId::ObjectsFolder, "Objects"),
        (ObjectId::TypesFolder, "Types"),
        (ObjectId::ViewsFolder, "Views"),
    ] {
        ObjectBuilder::new(&id.into(), name, name)
            .has_type_definition(ObjectTypeId::FolderType)
            .organized_by(ObjectId::RootFolder)
            .insert(space);
    }

    for (id, name) in [
        (ObjectId::ObjectTypesFolder, "ObjectTypes"),
        (ObjectId::VariableTypesFolder, "VariableTypes"),
        (ObjectId::DataTypesFolder, "DataTypes"),
        (ObjectId::ReferenceTypesFolder, "ReferenceTypes"),
    ] {
        ObjectBuilder::new(&id.into(), name, name)
            .has_type_definition(ObjectTypeId::FolderType)
            .organized_by(ObjectId::TypesFolder)
            .insert(space);
    }

    // Hang the type roots into their folders.
    space
        .add_reference(
            &ObjectId::ObjectTypesFolder.into(),
            ReferenceTypeId::Organizes,
            &ObjectTypeId::BaseObjectType.into(),
            true,
        )
        .expect("type roots exist");
    space
        .add_reference(
            &ObjectId::VariableTypesFolder.into(),
            ReferenceTypeId::Organizes,
            &VariableTypeId::BaseVariableType.into(),
            true,
        )
        .expect("type roots exist");
    space
        .add_reference(
            &ObjectId::DataTypesFolder.into(),
            ReferenceTypeId::Organizes,
            &DataTypeId::BaseDataType.into(),
            true,
        )
        .expect("type roots exist");
    space
        .add_reference(
            &ObjectId::ReferenceTypesFolder.into(),
            ReferenceTypeId::Organizes,
            &ReferenceTypeId::References.into(),
            true,
        )
        .expect("type roots exist");
}

/// Serves the server current time.
struct CurrentTimeSource;

impl DataSource for CurrentTimeSource {
    fn read(&self, _node_id: &NodeId) -> Result<DataValue, StatusCode> {
        Ok(DataValue::new_now(DateTime::now()))
    }
}

/// Serves the full server status structure.
struct ServerStatusSource {
    start_time: DateTime,
    build_info: BuildInfo,
}

impl DataSource for ServerStatusSource {
    fn read(&self, _node_id: &NodeId) -> Result<DataValue, StatusCode> {
        let status = ServerStatusDataType {
            start_time: self.start_time,
            current_time: DateTime::now(),
            state: ServerState::Running,
            build_info: self.build_info.clone(),
            seconds_till_shutdown: 0,
            shutdown_reason: Default::default(),
        };
        let ctx = ContextOwned::new_default();
        let object = ExtensionObject::from_message(&status, &ctx.context())
            .map_err(|_| StatusCode::BadInternalError)?;
        Ok(DataValue::new_now(Variant::ExtensionObject(object)))
    }
}

fn populate_server_object(space: &mut AddressSpace, application_uri: &str) {
    let start_time = DateTime::now();
    let build_info = BuildInfo {
        product_uri: UAString::from(application_uri),
        manufacturer_name: UAString::from("uaserve"),
        product_name: UAString::from("uaserve"),
        software_version: UAString::from(env!("CARGO_PKG_VERSION")),
        build_number: UAString::from("0"),
        build_date: start_time,
    };

    ObjectBuilder::new(&ObjectId::Server.into(), "Server", "Server")
        .has_type_definition(ObjectTypeId::ServerType)
        .organized_by(ObjectId::ObjectsFolder)
        .insert(space);

    // NamespaceArray and ServerArray values are refreshed by the address
    // space whenever a namespace is registered.
    VariableBuilder::new(
        &VariableId::Server_NamespaceArray.into(),
        "NamespaceArray",
        "NamespaceArray",
    )
    .data_type(DataTypeId::String)
    .value_rank(VALUE_RANK_ONE_DIMENSION)
    .value(vec!["http://opcfoundation.org/UA/".to_string()])
    .has_type_definition(VariableTypeId::PropertyType)
    .property_of(ObjectId::Server)
    .insert(space);

    VariableBuilder::new(
        &VariableId::Server_ServerArray.into(),
        "ServerArray",
        "ServerArray",
    )
    .data_type(DataTypeId::String)
    .value_rank(VALUE_RANK_ONE_DIMENSION)
    .value(vec![application_uri.to_string()])
    .has_type_definition(VariableTypeId::PropertyType)
    .property_of(ObjectId::Server)
    .insert(space);

    VariableBuilder::new(
        &VariableId::Server_ServerStatus.into(),
        "ServerStatus",
        "ServerStatus",
    )
    .data_type(DataTypeId::ServerStatusDataType)
    .value_source(Arc::new(ServerStatusSource {
        start_time,
        build_info,
    }))
    .has_type_definition(VariableTypeId::BaseDataVariableType)
    .component_of(ObjectId::Server)
    .insert(space);

    VariableBuilder::new(
        &VariableId::Server_ServerStatus_StartTime.into(),
        "StartTime",
        "StartTime",
    )
    .data_type(DataTypeId::DateTime)
    .value(start_time)
    .has_type_definition(VariableTypeId::BaseDataVariableType)
    .component_of(VariableId::Server_ServerStatus)
    .insert(space);

    VariableBuilder::new(
        &VariableId::Server_ServerStatus_CurrentTime.into(),
        "CurrentTime",
        "CurrentTime",
    )
    .data_type(DataTypeId::DateTime)
    .value_source(Arc::new(CurrentTimeSource))
    .has_type_definition(VariableTypeId::BaseDataVariableType)
    .component_of(VariableId::Server_ServerStatus)
    .insert(space);

    VariableBuilder::new(
        &VariableId::Server_ServerStatus_State.into(),
        "State",
        "State",
    )
    .data_type(DataTypeId::Enumeration)
    .value(ServerState::Running as i32)
    .has_type_definition(VariableTypeId::BaseDataVariableType)
    .component_of(VariableId::Server_ServerStatus)
    .insert(space);

    VariableBuilder::new(
        &VariableId::Server_ServiceLevel.into(),
        "ServiceLevel",
        "ServiceLevel",
    )
    .data_type(DataTypeId::Byte)
    .value(255u8)
    .has_type_definition(VariableTypeId::PropertyType)
    .property_of(ObjectId::Server)
    .access_level(AccessLevel::CURRENT_READ)
    .insert(space);
}
