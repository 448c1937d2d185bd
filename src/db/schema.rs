diesel::table! {
    products (id) {
        id -> Int4,
        descripcion_corta -> Text,
        descripcion_larga -> Text,
        precio -> Float8,
        stock -> Int4,
        descuento -> Float8,
        idrubro -> Int4,
        destacado -> Int4,
        imagen -> Varchar,
    }
}
