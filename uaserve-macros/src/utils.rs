use syn::{parse::Parse, Attribute, DataStruct, Field, Ident, Type};

pub trait ItemAttr {
    fn combine(&mut self, other: Self);
}

pub struct StructField<T> {
    pub ident: Ident,
    #[allow(unused)]
    pub typ: Type,
    pub attr: T,
}

pub struct StructItem<TFieldAttr> {
    pub ident: Ident,
    pub fields: Vec<StructField<TFieldAttr>>,
}

impl<TFieldAttr: Parse + ItemAttr + Default> StructItem<TFieldAttr> {
    pub fn from_input(input: DataStruct, ident: Ident) -> syn::Result<Self> {
        let fields = input
            .fields
            .into_iter()
            .map(StructField::from_field)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { ident, fields })
    }
}

impl<T: Parse + ItemAttr + Default> StructField<T> {
    pub fn from_field(field: Field) -> syn::Result<Self> {
        let Some(ident) = field.ident else {
            return Err(syn::Error::new_spanned(
                field,
                "Derive macro input must have named fields",
            ));
        };
        let mut final_attr = T::default();
        for attr in field.attrs {
            if is_uaserve_attr(&attr) {
                let data: T = attr.parse_args()?;
                final_attr.combine(data);
            }
        }
        Ok(StructField {
            ident,
            typ: field.ty,
            attr: final_attr,
        })
    }
}

pub fn is_uaserve_attr(attr: &Attribute) -> bool {
    attr.path().segments.len() == 1
        && attr
            .path()
            .segments
            .first()
            .is_some_and(|s| s.ident == "uaserve")
}
