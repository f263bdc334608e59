//! Macros for reducing boilerplate when describing resource types

/// Start a [`ResourceSchemaBuilder`](crate::core::schema::ResourceSchemaBuilder)
/// with the listed fields marked immutable
///
/// Each field is copied with `Clone` from the stored instance onto the
/// submitted one. Continue with `.mutable(..)`, `.embedded(..)` or `.build()`.
///
/// # Example
/// ```rust,ignore
/// fn schema(&self) -> ResourceSchema<Fish> {
///     immutable_fields!(Fish => [id, create_date])
///         .mutable("color")
///         .build()
/// }
/// ```
#[macro_export]
macro_rules! immutable_fields {
    ($type:ty => [ $( $field:ident ),* $(,)? ]) => {
        $crate::core::schema::ResourceSchema::<$type>::builder()
            $(
                .immutable(
                    stringify!($field),
                    |existing: &$type, incoming: &mut $type| {
                        incoming.$field = ::std::clone::Clone::clone(&existing.$field);
                    },
                )
            )*
    };
}

/// Implement [`Identity`](crate::core::auth::Identity) from an id field and
/// an admin flag field
///
/// # Example
/// ```rust,ignore
/// impl_identity!(User, id, is_admin);
/// ```
#[macro_export]
macro_rules! impl_identity {
    ($type:ty, $id:ident, $admin:ident) => {
        impl $crate::core::auth::Identity for $type {
            fn identity_id(&self) -> u64 {
                self.$id
            }

            fn has_admin_privileges(&self) -> bool {
                self.$admin
            }
        }
    };
}
