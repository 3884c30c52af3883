//! Permission markers for the drink routes.

use cafe_security::Permission;

pub struct GetDrinksDetail;
impl Permission for GetDrinksDetail {
    const NAME: &'static str = "get:drinks-detail";
}

pub struct PostDrinks;
impl Permission for PostDrinks {
    const NAME: &'static str = "post:drinks";
}

pub struct PatchDrinks;
impl Permission for PatchDrinks {
    const NAME: &'static str = "patch:drinks";
}

pub struct DeleteDrinks;
impl Permission for DeleteDrinks {
    const NAME: &'static str = "delete:drinks";
}
